//! The content fetcher contract and its type-erased client.

use std::error::Error as StdError;
use std::fmt::{self, Display};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::Instrument;

/// A retrieved page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FetchedPage {
    /// The extracted text content, usually markdown.
    pub content: String,
    /// The page title.
    pub title: Option<String>,
    /// The author, if the page declares one.
    pub author: Option<String>,
    /// The publication date as reported by the page.
    pub published: Option<String>,
}

impl FetchedPage {
    /// Creates a page with the given content and no metadata.
    #[inline]
    pub fn new<S: Into<String>>(content: S) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }

    /// Sets the page title.
    #[inline]
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the author.
    #[inline]
    pub fn with_author<S: Into<String>>(mut self, author: S) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Sets the publication date.
    #[inline]
    pub fn with_published<S: Into<String>>(mut self, published: S) -> Self {
        self.published = Some(published.into());
        self
    }
}

/// A type that retrieves the text content of a URL.
///
/// Implementors make a single attempt per call. Timeouts and the handling
/// of failures belong to the caller.
pub trait ContentFetcher: Send + Sync {
    /// The error type that may be returned by the fetcher.
    type Error: StdError + Send + Sync + 'static;

    /// Fetches the page at `url`.
    ///
    /// The returned future must not borrow `self`.
    fn fetch(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<FetchedPage, Self::Error>> + Send + 'static;
}

/// Why a fetch produced no page.
#[derive(Debug)]
pub(crate) enum FetchFailure {
    Fetcher(Box<dyn StdError + Send + Sync>),
    TimedOut(Duration),
    Aborted,
}

impl Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchFailure::Fetcher(err) => write!(f, "{err}"),
            FetchFailure::TimedOut(after) => {
                write!(f, "timed out after {after:?}")
            }
            FetchFailure::Aborted => write!(f, "fetch task aborted"),
        }
    }
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

type FetchResult = Result<FetchedPage, FetchFailure>;
type BoxedFetchFuture = Pin<Box<dyn Future<Output = FetchResult> + Send>>;
type FetchFn = Arc<dyn Fn(&str) -> BoxedFetchFuture + Send + Sync>;

/// A type-erased wrapper around a [`ContentFetcher`] that runs every fetch
/// as its own task under a timeout.
#[derive(Clone)]
pub(crate) struct FetchClient {
    fetch_fn: FetchFn,
    timeout: Duration,
}

impl FetchClient {
    pub fn new<F: ContentFetcher + 'static>(fetcher: F) -> Self {
        let fetch_fn: FetchFn = Arc::new(move |url: &str| {
            let fut = fetcher.fetch(url);
            Box::pin(async move {
                fut.await.map_err(|err| FetchFailure::Fetcher(Box::new(err)))
            })
        });
        Self {
            fetch_fn,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Starts fetching `url` right away.
    ///
    /// The fetch keeps running if the returned future is dropped, and
    /// settles on its own once the timeout elapses.
    pub fn fetch(&self, url: &str) -> impl Future<Output = FetchResult> + Send {
        let fut = (self.fetch_fn)(url);
        let after = self.timeout;
        let task = tokio::spawn(
            async move {
                let result = match timeout(after, fut).await {
                    Ok(result) => result,
                    Err(_) => Err(FetchFailure::TimedOut(after)),
                };
                trace!("fetch settled, ok: {}", result.is_ok());
                result
            }
            .instrument(debug_span!("fetch", url)),
        );
        async move {
            match task.await {
                Ok(result) => result,
                Err(err) => {
                    error!("fetch task failed: {err}");
                    Err(FetchFailure::Aborted)
                }
            }
        }
    }
}
