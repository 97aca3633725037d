use std::time::Duration;

use sleuth_core::research::{
    DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_MAX_ITERATIONS, DEFAULT_SOURCE_LIMIT,
};
use sleuth_core::{
    ArticleAnalysis, Cancellation, ContentFetcher, Engine, EngineBuilder,
    Error, ProgressReporter, ResearchRequest, ResearchResult, RoutingTable,
};
use sleuth_model::ModelProvider;

/// What a line typed by the user asks for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input<'a> {
    /// Research a question.
    Research(&'a str),
    /// Summarize the page at a URL.
    Analyze(&'a str),
    /// Nothing to do.
    Empty,
}

impl<'a> Input<'a> {
    /// Classifies a line of input.
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Input::Empty;
        }
        let is_url = (line.starts_with("http://")
            || line.starts_with("https://"))
            && !line.contains(char::is_whitespace);
        if is_url {
            Input::Analyze(line)
        } else {
            Input::Research(line)
        }
    }
}

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    engine_builder: EngineBuilder,
    limit: usize,
    max_iterations: usize,
    confidence_threshold: u8,
    deadline: Option<Duration>,
}

impl SessionBuilder {
    /// Creates a session builder with the given model provider and fetcher.
    pub fn new<P, F>(provider: P, fetcher: F) -> Self
    where
        P: ModelProvider + 'static,
        F: ContentFetcher + 'static,
    {
        Self {
            engine_builder: EngineBuilder::new(provider, fetcher),
            limit: DEFAULT_SOURCE_LIMIT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            deadline: None,
        }
    }

    /// Sets how many sources are examined per iteration.
    #[inline]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the maximum number of iterations.
    #[inline]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the confidence that ends the research early.
    #[inline]
    pub fn with_confidence_threshold(mut self, threshold: u8) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    /// Gives every research request a time budget.
    #[inline]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Replaces the default routing table.
    #[inline]
    pub fn with_routing_table(mut self, routing_table: RoutingTable) -> Self {
        self.engine_builder =
            self.engine_builder.with_routing_table(routing_table);
        self
    }

    /// Attaches a reporter for progress snapshots.
    #[inline]
    pub fn with_reporter(
        mut self,
        reporter: impl ProgressReporter + 'static,
    ) -> Self {
        self.engine_builder = self.engine_builder.with_reporter(reporter);
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Session {
        Session {
            engine: self.engine_builder.build(),
            limit: self.limit,
            max_iterations: self.max_iterations,
            confidence_threshold: self.confidence_threshold,
            deadline: self.deadline,
        }
    }
}

/// A research session, like a prompt that takes questions and prints
/// answers.
///
/// The session holds a fully configured engine and applies the same
/// options to every request.
pub struct Session {
    engine: Engine,
    limit: usize,
    max_iterations: usize,
    confidence_threshold: u8,
    deadline: Option<Duration>,
}

impl Session {
    /// Researches a question.
    pub async fn research(&self, text: &str) -> Result<ResearchResult, Error> {
        let request = ResearchRequest::new(text)
            .with_limit(self.limit)
            .with_max_iterations(self.max_iterations)
            .with_confidence_threshold(self.confidence_threshold);
        let cancellation = match self.deadline {
            Some(deadline) => Cancellation::default().with_timeout(deadline),
            None => Cancellation::default(),
        };
        self.engine
            .run_with_cancellation(request, cancellation)
            .await
    }

    /// Summarizes a single page.
    #[inline]
    pub async fn analyze(&self, url: &str) -> Result<ArticleAnalysis, Error> {
        self.engine.analyze_article(url).await
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as StdError;
    use std::fmt::{self, Display};

    use sleuth_core::{ErrorKind, FetchedPage};
    use sleuth_test_model::TestModelProvider;

    use super::*;

    #[derive(Debug)]
    struct Offline;

    impl Display for Offline {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "offline")
        }
    }

    impl StdError for Offline {}

    struct EchoFetcher;

    impl ContentFetcher for EchoFetcher {
        type Error = Offline;

        fn fetch(
            &self,
            url: &str,
        ) -> impl Future<Output = Result<FetchedPage, Self::Error>> + Send + 'static
        {
            let page = FetchedPage::new(format!("Everything about {url}"));
            async move { Ok(page) }
        }
    }

    #[test]
    fn test_input() {
        assert_eq!(Input::parse("  \n"), Input::Empty);
        assert_eq!(
            Input::parse("What is Firecrawl?\n"),
            Input::Research("What is Firecrawl?")
        );
        assert_eq!(
            Input::parse(" https://firecrawl.dev/blog \n"),
            Input::Analyze("https://firecrawl.dev/blog")
        );
        assert_eq!(
            Input::parse("https://firecrawl.dev is it good?"),
            Input::Research("https://firecrawl.dev is it good?")
        );
        assert_eq!(
            Input::parse("ftp://example.com"),
            Input::Research("ftp://example.com")
        );
    }

    #[tokio::test]
    async fn test_session_applies_options() {
        let provider = TestModelProvider::default();
        provider.add_text_response("QUERY: firecrawl");
        provider.add_text_response("• Firecrawl scrapes.");
        provider.add_text_response(
            "CONFIDENCE: 30\nREASONING: Thin.\nNEXT_QUERY: firecrawl docs",
        );
        provider.add_text_response("Firecrawl scrapes websites.");

        let session = SessionBuilder::new(provider.clone(), EchoFetcher)
            .with_limit(2)
            .with_max_iterations(1)
            .build();
        let result = session.research("What is Firecrawl?").await.unwrap();
        assert_eq!(result.iterations.len(), 1);
        assert_eq!(result.sources.len(), 2);
        assert_eq!(result.final_summary, "Firecrawl scrapes websites.");
    }

    #[tokio::test]
    async fn test_session_deadline() {
        let provider = TestModelProvider::default();
        let session = SessionBuilder::new(provider, EchoFetcher)
            .with_deadline(Duration::ZERO)
            .build();
        let err = session.research("What is Firecrawl?").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Cancelled);
    }
}
