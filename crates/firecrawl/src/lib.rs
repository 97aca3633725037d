//! A content fetcher backed by the Firecrawl scraping API.
//!
//! Pages are requested as markdown with boilerplate stripped, which is the
//! shape the research engine feeds to the oracle.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod config;
mod proto;

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use sleuth_core::{ContentFetcher, FetchedPage};

pub use config::{FirecrawlConfig, FirecrawlConfigBuilder};
use proto::{ScrapeRequest, ScrapeResponse};

/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The API could not be reached.
    Transport,
    /// The API or the scraped site refused the request.
    Rejected,
    /// The API answered with something unexpected.
    InvalidResponse,
}

/// Error type for [`FirecrawlFetcher`].
#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }

    /// Returns the error message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

/// Fetches pages through Firecrawl's `/v1/scrape` endpoint.
#[derive(Clone, Debug)]
pub struct FirecrawlFetcher {
    client: Client,
    config: Arc<FirecrawlConfig>,
}

impl FirecrawlFetcher {
    /// Creates a new `FirecrawlFetcher` with the given configuration.
    #[inline]
    pub fn new(config: FirecrawlConfig) -> Self {
        Self {
            client: Client::new(),
            config: Arc::new(config),
        }
    }
}

impl ContentFetcher for FirecrawlFetcher {
    type Error = Error;

    fn fetch(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<FetchedPage, Self::Error>> + Send + 'static
    {
        let body = ScrapeRequest::new(url, self.config.only_main_content);
        let resp_fut = self
            .client
            .post(self.config.scrape_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send();
        let url = url.to_owned();

        async move {
            let resp = resp_fut.await.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::Transport)
            })?;
            let status = resp.status();
            let parsed = resp.json::<ScrapeResponse>().await;
            if !status.is_success() {
                return Err(error_from_status(status, parsed.ok()));
            }
            let parsed = parsed.map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::InvalidResponse)
            })?;
            let page = page_from_response(parsed)?;
            debug!("scraped {url}, {} bytes of markdown", page.content.len());
            Ok(page)
        }
    }
}

fn error_from_status(
    status: StatusCode,
    body: Option<ScrapeResponse>,
) -> Error {
    let message = match body.and_then(|body| body.error) {
        Some(error) => format!("{status}: {error}"),
        None => format!("{status}"),
    };
    warn!("scrape request rejected: {message}");
    Error::new(message, ErrorKind::Rejected)
}

fn page_from_response(resp: ScrapeResponse) -> Result<FetchedPage, Error> {
    if !resp.success {
        let message = resp.error.unwrap_or_else(|| "scrape failed".to_owned());
        return Err(Error::new(message, ErrorKind::Rejected));
    }
    let Some(data) = resp.data else {
        let kind = ErrorKind::InvalidResponse;
        return Err(Error::new("response has no data", kind));
    };
    if let Some(code) = data.metadata.status_code.filter(|c| *c >= 400) {
        let message = match &data.metadata.error {
            Some(error) => format!("page answered {code}: {error}"),
            None => format!("page answered {code}"),
        };
        return Err(Error::new(message, ErrorKind::Rejected));
    }
    Ok(data.into())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(value: serde_json::Value) -> ScrapeResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_page_from_response() {
        let page = page_from_response(parse(json!({
            "success": true,
            "data": {
                "markdown": "Docs",
                "metadata": { "title": "Firecrawl Docs", "statusCode": 200 }
            }
        })))
        .unwrap();
        assert_eq!(page.content, "Docs");
        assert_eq!(page.title.as_deref(), Some("Firecrawl Docs"));
    }

    #[test]
    fn test_failed_scrapes() {
        let err = page_from_response(parse(json!({
            "success": false,
            "error": "Insufficient credits"
        })))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Rejected);
        assert_eq!(err.message(), "Insufficient credits");

        let err = page_from_response(parse(json!({ "success": true })))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);

        let err = page_from_response(parse(json!({
            "success": true,
            "data": {
                "markdown": "",
                "metadata": { "statusCode": 404, "error": "Not Found" }
            }
        })))
        .unwrap_err();
        assert_eq!(err.message(), "page answered 404: Not Found");
    }

    #[test]
    fn test_error_from_status() {
        let body = parse(json!({ "success": false, "error": "Unauthorized" }));
        let err = error_from_status(StatusCode::UNAUTHORIZED, Some(body));
        assert_eq!(err.message(), "401 Unauthorized: Unauthorized");
        assert_eq!(err.kind(), ErrorKind::Rejected);

        let err = error_from_status(StatusCode::BAD_GATEWAY, None);
        assert_eq!(err.message(), "502 Bad Gateway");
    }

    #[tokio::test]
    async fn test_unreachable_api() {
        // Nothing listens on the discard port.
        let config = FirecrawlConfigBuilder::with_api_key("fc-test")
            .with_base_url("http://127.0.0.1:9")
            .build();
        let fetcher = FirecrawlFetcher::new(config);
        let err = fetcher.fetch("https://example.com").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
