use serde::{Deserialize, Serialize};

use crate::fetch::FetchedPage;
use crate::oracle::ArticleDigest;
use crate::prompt::truncate_chars;

const EXCERPT_CHARS: usize = 300;
const WORDS_PER_MINUTE: usize = 200;

/// A single page, summarized.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleAnalysis {
    /// The analyzed URL.
    pub url: String,
    /// The page title, or `Untitled`.
    pub title: String,
    /// The author, if the page declares one.
    pub author: Option<String>,
    /// The publication date as reported by the page.
    pub published: Option<String>,
    /// The beginning of the content.
    pub excerpt: String,
    /// The oracle's summary.
    pub summary: String,
    /// The oracle's key points, markers stripped.
    pub key_points: Vec<String>,
    /// Whitespace-separated words in the content.
    pub word_count: usize,
    /// Estimated reading time, rounded up.
    pub reading_minutes: usize,
}

impl ArticleAnalysis {
    pub(crate) fn new(
        url: &str,
        page: FetchedPage,
        digest: ArticleDigest,
    ) -> Self {
        let word_count = page.content.split_whitespace().count();
        let excerpt =
            format!("{}...", truncate_chars(&page.content, EXCERPT_CHARS));
        Self {
            url: url.to_owned(),
            title: page_title(&page).to_owned(),
            author: page.author,
            published: page.published,
            excerpt,
            summary: digest.summary,
            key_points: digest.key_points,
            word_count,
            reading_minutes: word_count.div_ceil(WORDS_PER_MINUTE),
        }
    }
}

pub(crate) fn page_title(page: &FetchedPage) -> &str {
    page.title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_stats() {
        let content = "word ".repeat(401);
        let page = FetchedPage::new(content).with_author("Jane");
        let digest = ArticleDigest {
            summary: "Words.".to_owned(),
            key_points: vec![],
        };
        let analysis = ArticleAnalysis::new("https://a.example", page, digest);
        assert_eq!(analysis.word_count, 401);
        assert_eq!(analysis.reading_minutes, 3);
        assert_eq!(analysis.title, "Untitled");
        assert_eq!(analysis.author.as_deref(), Some("Jane"));
        assert_eq!(analysis.excerpt.chars().count(), 303);
        assert!(analysis.excerpt.ends_with("..."));
    }
}
