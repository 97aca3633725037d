//! Candidate source selection.
//!
//! A query is routed through an ordered table of topic pools; the first
//! route with a keyword contained in the query wins, otherwise the fallback
//! templates are expanded for the query. Each iteration takes the next
//! page of the pool, so later iterations see new URLs.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::research::Source;

/// A topic pool guarded by keywords.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Matched case-insensitively as substrings of the query. Blank
    /// keywords never match.
    pub keywords: Vec<String>,
    /// URL templates, see [`RoutingTable`] for placeholders.
    pub urls: Vec<String>,
}

impl Route {
    fn matches(&self, query: &str) -> bool {
        self.keywords.iter().any(|keyword| {
            let keyword = keyword.trim();
            !keyword.is_empty() && query.contains(&keyword.to_lowercase())
        })
    }
}

/// The data that drives candidate selection.
///
/// URL templates may contain `{query}`, replaced by the percent-encoded
/// query, and `{slug}`, replaced by the query with spaces turned into
/// underscores and then percent-encoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoutingTable {
    /// Routes, tried in order.
    #[serde(default)]
    pub routes: Vec<Route>,
    /// Templates used when no route matches.
    #[serde(default)]
    pub fallback: Vec<String>,
}

impl RoutingTable {
    /// Parses a routing table from JSON.
    #[inline]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns the full, de-duplicated candidate pool for `query`.
    pub fn pool(&self, query: &str) -> Vec<String> {
        let lowercased = query.to_lowercase();
        let templates = self
            .routes
            .iter()
            .find(|route| route.matches(&lowercased))
            .map_or(&self.fallback, |route| &route.urls);

        let mut seen = HashSet::new();
        templates
            .iter()
            .map(|template| expand(template, query))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }

    /// Returns the candidates for iteration `index`, at most `limit` of
    /// them. An empty list means the pool is exhausted.
    pub fn select(&self, query: &str, index: usize, limit: usize) -> Vec<Source> {
        let pool = self.pool(query);
        let Some(start) = index.checked_mul(limit).filter(|s| *s < pool.len())
        else {
            return vec![];
        };
        let end = start.saturating_add(limit).min(pool.len());
        pool[start..end].iter().map(Source::new).collect()
    }
}

impl Default for RoutingTable {
    fn default() -> Self {
        fn urls(urls: &[&str]) -> Vec<String> {
            urls.iter().map(|url| (*url).to_owned()).collect()
        }

        Self {
            routes: vec![
                Route {
                    keywords: urls(&["firecrawl"]),
                    urls: urls(&[
                        "https://firecrawl.dev",
                        "https://docs.firecrawl.dev",
                        "https://github.com/mendableai/firecrawl",
                        "https://www.producthunt.com/products/firecrawl",
                        "https://news.ycombinator.com/item?id=40252569",
                        "https://dev.to/mendalelabs/introducing-firecrawl-5fl6",
                        "https://medium.com/@mendable/firecrawl-introduction",
                        "https://www.reddit.com/r/webdev/comments/firecrawl",
                    ]),
                },
                Route {
                    keywords: urls(&["ai", "artificial intelligence"]),
                    urls: urls(&[
                        "https://openai.com/blog",
                        "https://www.anthropic.com/news",
                        "https://www.theverge.com/ai-artificial-intelligence",
                        "https://techcrunch.com/category/artificial-intelligence/",
                        "https://arstechnica.com/ai/",
                        "https://www.wired.com/tag/artificial-intelligence/",
                        "https://venturebeat.com/ai/",
                        "https://www.technologyreview.com/topic/artificial-intelligence/",
                    ]),
                },
            ],
            fallback: urls(&[
                "https://en.wikipedia.org/wiki/{slug}",
                "https://www.britannica.com/search?query={query}",
                "https://www.reuters.com/search/news?query={query}",
                "https://www.theguardian.com/search?q={query}",
                "https://www.bbc.com/search?q={query}",
                "https://scholar.google.com/scholar?q={query}",
                "https://www.nature.com/search?q={query}",
                "https://www.sciencedirect.com/search?qs={query}",
            ]),
        }
    }
}

fn expand(template: &str, query: &str) -> String {
    let mut url = template.to_owned();
    if url.contains("{slug}") {
        let slug = urlencoding::encode(&query.replace(' ', "_")).into_owned();
        url = url.replace("{slug}", &slug);
    }
    if url.contains("{query}") {
        url = url.replace("{query}", &urlencoding::encode(query));
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(sources: &[Source]) -> Vec<&str> {
        sources.iter().map(Source::url).collect()
    }

    #[test]
    fn test_topic_routing() {
        let table = RoutingTable::default();

        let sources = table.select("Firecrawl overview", 0, 5);
        assert_eq!(
            urls(&sources),
            vec![
                "https://firecrawl.dev",
                "https://docs.firecrawl.dev",
                "https://github.com/mendableai/firecrawl",
                "https://www.producthunt.com/products/firecrawl",
                "https://news.ycombinator.com/item?id=40252569",
            ]
        );
        assert_eq!(sources[3].title(), "producthunt.com");

        // "firecrawl" wins even though "ai" matches too.
        let sources = table.select("firecrawl ai features", 0, 1);
        assert_eq!(urls(&sources), vec!["https://firecrawl.dev"]);

        let sources = table.select("Artificial Intelligence news", 0, 2);
        assert_eq!(
            urls(&sources),
            vec!["https://openai.com/blog", "https://www.anthropic.com/news"]
        );
    }

    #[test]
    fn test_fallback_templates() {
        let table = RoutingTable::default();
        let sources = table.select("rust borrow checker", 0, 2);
        assert_eq!(
            urls(&sources),
            vec![
                "https://en.wikipedia.org/wiki/rust_borrow_checker",
                "https://www.britannica.com/search?query=rust%20borrow%20checker",
            ]
        );
        assert_eq!(sources[0].title(), "en.wikipedia.org");

        let sources = table.select("C++ & you", 0, 1);
        assert_eq!(
            urls(&sources),
            vec!["https://en.wikipedia.org/wiki/C%2B%2B_%26_you"]
        );
    }

    #[test]
    fn test_pagination() {
        let table = RoutingTable::default();
        assert_eq!(table.select("firecrawl", 1, 5).len(), 3);
        assert!(table.select("firecrawl", 2, 5).is_empty());
        assert!(table.select("firecrawl", 5, 5).is_empty());
        assert!(table.select("firecrawl", 0, 0).is_empty());
        assert!(table.select("firecrawl", usize::MAX, 2).is_empty());
        assert_eq!(table.select("firecrawl", 0, usize::MAX).len(), 8);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let table = RoutingTable::default();
        for (query, index) in [("firecrawl", 0), ("ai safety", 1), ("tea", 0)] {
            assert_eq!(
                table.select(query, index, 3),
                table.select(query, index, 3)
            );
        }
    }

    #[test]
    fn test_from_json() {
        let table = RoutingTable::from_json(
            r#"{
                "routes": [
                    { "keywords": ["Tokio"], "urls": ["https://tokio.rs", "https://tokio.rs"] }
                ],
                "fallback": ["https://duckduckgo.com/html/?q={query}"]
            }"#,
        )
        .unwrap();
        assert_eq!(urls(&table.select("tokio tasks", 0, 5)), vec!["https://tokio.rs"]);
        assert_eq!(
            urls(&table.select("async io", 0, 5)),
            vec!["https://duckduckgo.com/html/?q=async%20io"]
        );

        let empty = RoutingTable::from_json("{}").unwrap();
        assert!(empty.select("anything", 0, 5).is_empty());
    }

    #[test]
    fn test_blank_keywords_never_match() {
        let table = RoutingTable::from_json(
            r#"{
                "routes": [
                    { "keywords": ["", "  "], "urls": ["https://a.example"] }
                ],
                "fallback": ["https://fb.example/?q={query}"]
            }"#,
        )
        .unwrap();
        assert_eq!(
            urls(&table.select("tea ceremony", 0, 5)),
            vec!["https://fb.example/?q=tea%20ceremony"]
        );
    }
}
