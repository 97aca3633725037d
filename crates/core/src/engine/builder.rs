use std::time::Duration;

use sleuth_model::ModelProvider;

use super::Engine;
use crate::fetch::{ContentFetcher, FetchClient};
use crate::model_client::ModelClient;
use crate::oracle::{Oracle, RetryPolicy};
use crate::selector::RoutingTable;
use crate::snapshot::ProgressReporter;

const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_CONTENT_PREFIX: usize = 1000;
const DEFAULT_MAX_FINDINGS: usize = 2;
const DEFAULT_ARTICLE_PREFIX: usize = 4000;

/// [`Engine`] builder.
pub struct EngineBuilder {
    pub(crate) model_client: ModelClient,
    pub(crate) fetch_client: FetchClient,
    pub(crate) routing_table: RoutingTable,
    pub(crate) reporter: Option<Box<dyn ProgressReporter>>,
    pub(crate) fetch_timeout: Duration,
    pub(crate) oracle_timeout: Duration,
    pub(crate) retry: RetryPolicy,
    pub(crate) content_prefix: usize,
    pub(crate) max_findings: usize,
    pub(crate) article_prefix: usize,
}

impl EngineBuilder {
    /// Creates a new builder with the model provider that answers prompts
    /// and the fetcher that retrieves pages.
    #[inline]
    pub fn new<P, F>(provider: P, fetcher: F) -> Self
    where
        P: ModelProvider + 'static,
        F: ContentFetcher + 'static,
    {
        Self {
            model_client: ModelClient::new(provider),
            fetch_client: FetchClient::new(fetcher),
            routing_table: RoutingTable::default(),
            reporter: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            oracle_timeout: DEFAULT_ORACLE_TIMEOUT,
            retry: RetryPolicy::default(),
            content_prefix: DEFAULT_CONTENT_PREFIX,
            max_findings: DEFAULT_MAX_FINDINGS,
            article_prefix: DEFAULT_ARTICLE_PREFIX,
        }
    }

    /// Replaces the default routing table.
    #[inline]
    pub fn with_routing_table(mut self, routing_table: RoutingTable) -> Self {
        self.routing_table = routing_table;
        self
    }

    /// Attaches a reporter that receives a snapshot after every phase.
    #[inline]
    pub fn with_reporter(
        mut self,
        reporter: impl ProgressReporter + 'static,
    ) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Sets the timeout of a single fetch.
    #[inline]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Sets the timeout of a single oracle attempt.
    #[inline]
    pub fn with_oracle_timeout(mut self, timeout: Duration) -> Self {
        self.oracle_timeout = timeout;
        self
    }

    /// Sets how failed oracle attempts are retried.
    #[inline]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets how many characters of each page are shown to the oracle when
    /// extracting findings.
    #[inline]
    pub fn with_content_prefix(mut self, chars: usize) -> Self {
        self.content_prefix = chars;
        self
    }

    /// Sets how many findings are kept per iteration.
    #[inline]
    pub fn with_max_findings(mut self, max_findings: usize) -> Self {
        self.max_findings = max_findings;
        self
    }

    /// Builds the engine.
    pub fn build(self) -> Engine {
        let Self {
            model_client,
            fetch_client,
            routing_table,
            reporter,
            fetch_timeout,
            oracle_timeout,
            retry,
            content_prefix,
            max_findings,
            article_prefix,
        } = self;

        Engine {
            oracle: Oracle::new(model_client, oracle_timeout, retry),
            fetch_client: fetch_client.with_timeout(fetch_timeout),
            routing_table,
            reporter,
            content_prefix,
            max_findings,
            article_prefix,
        }
    }
}
