//! Prompt templates for every oracle call.

/// Returns the longest prefix of `text` with at most `max_chars`
/// characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Fetched content handed to the extraction prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceContent {
    pub title: String,
    pub content: String,
}

pub fn plan(request: &str) -> String {
    format!(
        "Analyze this search request: \"{request}\"

Provide:
1. A clear, specific search query (max 5 words)
2. Key topics to look for
3. Expected information type

Format as:
QUERY: [your query]
TOPICS: [comma-separated topics]
TYPE: [article/news/documentation/general]"
    )
}

pub fn extract_findings(
    request: &str,
    sources: &[SourceContent],
    content_prefix: usize,
    max_findings: usize,
) -> String {
    let combined = sources
        .iter()
        .map(|source| {
            format!(
                "Source: {}\n{}\n---",
                source.title,
                truncate_chars(&source.content, content_prefix)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    format!(
        "Based on these search results about \"{request}\", provide exactly \
         {max_findings} key bullet points.

Content:
{combined}

Provide ONLY {max_findings} bullet points, each starting with \"•\". Be \
         concise and informative."
    )
}

pub fn assess(request: &str, findings: &[String], threshold: u8) -> String {
    let findings = findings.join("\n");
    format!(
        "Assess the confidence level for answering \"{request}\" based on the \
         information gathered.

Bullet points found:
{findings}

Provide:
1. Confidence percentage (0-100)
2. Brief reasoning (max 20 words)
3. If confidence < {threshold}%, suggest a refined search query

Format:
CONFIDENCE: [number]
REASONING: [text]
NEXT_QUERY: [query or \"none\"]"
    )
}

pub fn synthesize<'a>(
    request: &str,
    findings: impl IntoIterator<Item = &'a str>,
) -> String {
    let numbered = findings
        .into_iter()
        .enumerate()
        .map(|(i, finding)| format!("{}. {finding}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Create a comprehensive response for \"{request}\" based on the \
         research findings.

Key findings:
{numbered}

Provide a clear, well-structured response that directly answers the \
         request. Write in a natural, conversational tone."
    )
}

pub fn analyze_article(title: &str, url: &str, content: &str) -> String {
    format!(
        "Analyze and summarize the following article. Provide a \
         comprehensive summary and extract key points.

Title: {title}
URL: {url}

Content:
{content}

Provide:
1. A clear, informative summary (2-3 paragraphs)
2. 3-5 key bullet points
3. Any notable insights or takeaways

Format your response as:
SUMMARY:
[Your summary here]

KEY POINTS:
• [Point 1]
• [Point 2]
• [Point 3]
[etc.]"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("héllo", 5), "héllo");
        assert_eq!(truncate_chars("héllo", 50), "héllo");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_extraction_layout() {
        let sources = [
            SourceContent {
                title: "Firecrawl".to_owned(),
                content: "a".repeat(1500),
            },
            SourceContent {
                title: "docs.firecrawl.dev".to_owned(),
                content: "Turn websites into LLM-ready data.".to_owned(),
            },
        ];
        let prompt = extract_findings("What is Firecrawl?", &sources, 1000, 2);
        let expected = format!(
            "Source: Firecrawl\n{}\n---\n\nSource: docs.firecrawl.dev\n\
             Turn websites into LLM-ready data.\n---",
            "a".repeat(1000)
        );
        assert!(prompt.contains(&expected));
        assert!(prompt.contains("provide exactly 2 key bullet points"));
        assert!(!prompt.contains(&"a".repeat(1001)));
    }

    #[test]
    fn test_synthesis_numbering() {
        let prompt = synthesize("What is Firecrawl?", ["Scrapes", "Crawls"]);
        assert!(prompt.contains("Key findings:\n1. Scrapes\n2. Crawls\n"));
    }

    #[test]
    fn test_assessment_threshold() {
        let prompt = assess("q", &["• one".to_owned()], 70);
        assert!(prompt.contains("If confidence < 70%"));
        assert!(prompt.contains("Bullet points found:\n• one\n"));
    }
}
