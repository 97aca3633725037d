use std::fmt::{self, Debug, Formatter};

const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";

/// Builder for [`FirecrawlConfig`].
#[derive(Clone, PartialEq, Eq)]
pub struct FirecrawlConfigBuilder {
    api_key: String,
    base_url: Option<String>,
    only_main_content: bool,
}

impl FirecrawlConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
            only_main_content: true,
        }
    }

    /// Sets a custom base URL, e.g. a self-hosted instance.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets whether navigation, headers and footers are stripped. Defaults
    /// to `true`.
    #[inline]
    pub fn with_only_main_content(mut self, only_main_content: bool) -> Self {
        self.only_main_content = only_main_content;
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> FirecrawlConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        FirecrawlConfig {
            api_key: self.api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
            only_main_content: self.only_main_content,
        }
    }
}

impl Debug for FirecrawlConfigBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirecrawlConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("only_main_content", &self.only_main_content)
            .finish()
    }
}

/// Configuration for [`FirecrawlFetcher`](crate::FirecrawlFetcher).
#[derive(Clone, PartialEq, Eq)]
pub struct FirecrawlConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) only_main_content: bool,
}

impl FirecrawlConfig {
    #[inline]
    pub(crate) fn scrape_url(&self) -> String {
        format!("{}/v1/scrape", self.base_url)
    }
}

impl Debug for FirecrawlConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirecrawlConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("only_main_content", &self.only_main_content)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_redaction() {
        let config = FirecrawlConfigBuilder::with_api_key("fc-secret").build();
        assert_eq!(config.scrape_url(), "https://api.firecrawl.dev/v1/scrape");
        assert!(config.only_main_content);
        assert!(!format!("{config:?}").contains("fc-secret"));

        let config = FirecrawlConfigBuilder::with_api_key("fc-secret")
            .with_base_url("http://localhost:3002/")
            .with_only_main_content(false)
            .build();
        assert_eq!(config.scrape_url(), "http://localhost:3002/v1/scrape");
        assert!(!config.only_main_content);
    }
}
