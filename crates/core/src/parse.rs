//! Tolerant readers for labelled fields in oracle replies.
//!
//! Models rarely follow a reply format to the letter: labels change case,
//! get wrapped in markdown emphasis or drift onto numbered lines. Every
//! reader here returns `None` instead of failing, and callers pick the
//! default.

use regex::Regex;

const BULLET_MARKERS: [char; 3] = ['•', '-', '*'];

/// Returns the single-line value that follows `LABEL:`.
///
/// Surrounding whitespace, emphasis markers, quotes and brackets are
/// trimmed. An empty value counts as missing.
pub fn field<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    let pattern =
        format!(r"(?im)\b{}\**[ \t]*:[ \t]*(.+)$", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(text)?.get(1)?.as_str();
    let value = trim_decorations(value);
    (!value.is_empty()).then_some(value)
}

/// Returns the first integer on the line that carries `LABEL`.
pub fn integer(text: &str, label: &str) -> Option<u64> {
    let pattern =
        format!(r"(?i)\b{}\b[^0-9\r\n]*(\d+)", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Returns the multi-line block that starts after `LABEL:` and ends at
/// `next_label` or the end of the text.
pub fn section<'a>(
    text: &'a str,
    label: &str,
    next_label: Option<&str>,
) -> Option<&'a str> {
    let end = match next_label {
        Some(next) => format!(r"(?:\b{}\**[ \t]*:|\z)", regex::escape(next)),
        None => r"\z".to_owned(),
    };
    let pattern =
        format!(r"(?is)\b{}\**[ \t]*:\**(.*?){end}", regex::escape(label));
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(text)?.get(1)?.as_str().trim();
    (!value.is_empty()).then_some(value)
}

/// Returns the items of every bulleted line, with the marker stripped.
///
/// `•` may be followed directly by text, `-` and `*` need a space so that
/// emphasis and rules are not mistaken for bullets.
pub fn bullets(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| bullet_item(line.trim()))
        .map(str::to_owned)
        .collect()
}

fn bullet_item(line: &str) -> Option<&str> {
    let marker = line.chars().next().filter(|c| BULLET_MARKERS.contains(c))?;
    let rest = &line[marker.len_utf8()..];
    if marker != '•' && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let item = rest.trim();
    (!item.is_empty()).then_some(item)
}

/// Reads a refined query, treating `none` and its look-alikes as missing.
pub fn next_query(text: &str, label: &str) -> Option<String> {
    let value = field(text, label)?;
    let is_none = matches!(
        value.to_ascii_lowercase().as_str(),
        "none" | "n/a" | "null" | "-"
    );
    (!is_none).then(|| value.to_owned())
}

fn trim_decorations(value: &str) -> &str {
    value.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '*' | '"' | '\'' | '`' | '[' | ']')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field() {
        let reply = "QUERY: firecrawl overview\nTOPICS: scraping, crawling\n\
                     TYPE: [documentation]";
        assert_eq!(field(reply, "QUERY"), Some("firecrawl overview"));
        assert_eq!(field(reply, "topics"), Some("scraping, crawling"));
        assert_eq!(field(reply, "TYPE"), Some("documentation"));
        assert_eq!(field(reply, "MISSING"), None);

        assert_eq!(
            field("**Query:** \"rust async runtimes\"", "QUERY"),
            Some("rust async runtimes")
        );
        assert_eq!(field("QUERY:   \nTOPICS: x", "QUERY"), None);
    }

    #[test]
    fn test_field_needs_whole_label() {
        let reply = "NEXT_QUERY: firecrawl pricing";
        assert_eq!(field(reply, "QUERY"), None);
        assert_eq!(field(reply, "NEXT_QUERY"), Some("firecrawl pricing"));
    }

    #[test]
    fn test_integer() {
        let reply = "CONFIDENCE: 90\nREASONING: ok";
        assert_eq!(integer(reply, "CONFIDENCE"), Some(90));
        assert_eq!(integer("**Confidence**: 75%", "CONFIDENCE"), Some(75));
        assert_eq!(integer("CONFIDENCE: [number]", "CONFIDENCE"), None);
        assert_eq!(integer("REASONING: 3 sources", "CONFIDENCE"), None);
    }

    #[test]
    fn test_section() {
        let reply = "SUMMARY: Firecrawl turns sites into markdown.\n\
                     It also crawls.\nKEY POINTS:\n• Fast\n• Open source";
        assert_eq!(
            section(reply, "SUMMARY", Some("KEY POINTS")),
            Some("Firecrawl turns sites into markdown.\nIt also crawls.")
        );
        assert_eq!(
            section(reply, "KEY POINTS", None),
            Some("• Fast\n• Open source")
        );
        assert_eq!(section("no labels here", "SUMMARY", None), None);
    }

    #[test]
    fn test_bullets() {
        let reply = "Here are the findings:\n• First point\n  - Second point\n\
                     * Third point\n**bold line**\n---\n•\n•Fourth";
        assert_eq!(
            bullets(reply),
            vec!["First point", "Second point", "Third point", "Fourth"]
        );
        assert!(bullets("no bullets at all").is_empty());
    }

    #[test]
    fn test_next_query() {
        assert_eq!(next_query("NEXT_QUERY: none", "NEXT_QUERY"), None);
        assert_eq!(next_query("NEXT_QUERY: \"None\"", "NEXT_QUERY"), None);
        assert_eq!(next_query("NEXT_QUERY: [none]", "NEXT_QUERY"), None);
        assert_eq!(
            next_query("NEXT_QUERY: firecrawl api limits", "NEXT_QUERY"),
            Some("firecrawl api limits".to_owned())
        );
        assert_eq!(next_query("CONFIDENCE: 40", "NEXT_QUERY"), None);
    }
}
