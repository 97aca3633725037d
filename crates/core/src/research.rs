//! Values that flow in and out of a research run.

use serde::{Deserialize, Serialize};
use url::Url;

/// The default number of sources examined per iteration.
pub const DEFAULT_SOURCE_LIMIT: usize = 5;
/// The default number of iterations.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;
/// The default confidence that ends the loop early.
pub const DEFAULT_CONFIDENCE_THRESHOLD: u8 = 85;

/// The text used when no findings were collected.
pub const NOT_FOUND_TEXT: &str =
    "Unable to find relevant information for your request.";

/// A research request with its per-run options.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResearchRequest {
    text: String,
    limit: usize,
    max_iterations: usize,
    confidence_threshold: u8,
}

impl ResearchRequest {
    /// Creates a request with default options.
    #[inline]
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            limit: DEFAULT_SOURCE_LIMIT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
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

    /// Sets the confidence that ends the loop. Values above 100 are
    /// clamped.
    #[inline]
    pub fn with_confidence_threshold(mut self, threshold: u8) -> Self {
        self.confidence_threshold = threshold.min(100);
        self
    }

    /// Returns the raw request text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the per-iteration source limit.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the maximum number of iterations.
    #[inline]
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Returns the confidence threshold.
    #[inline]
    pub fn confidence_threshold(&self) -> u8 {
        self.confidence_threshold
    }
}

/// The outcome of fetching a [`Source`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    /// No fetch attempt has completed yet.
    #[default]
    Pending,
    /// The page was retrieved.
    Fetched,
    /// The fetch failed or timed out.
    Failed,
}

/// A candidate page.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Source {
    url: String,
    title: String,
    status: FetchStatus,
}

impl Source {
    /// Creates a pending source whose title is derived from the URL.
    pub fn new<S: Into<String>>(url: S) -> Self {
        let url = url.into();
        let title = display_host(&url).unwrap_or_else(|| url.clone());
        Self {
            url,
            title,
            status: FetchStatus::Pending,
        }
    }

    /// Returns the URL, which is also the identity of the source.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the display title.
    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the fetch status.
    #[inline]
    pub fn status(&self) -> FetchStatus {
        self.status
    }

    /// Returns whether the page was retrieved.
    #[inline]
    pub fn is_fetched(&self) -> bool {
        self.status == FetchStatus::Fetched
    }

    /// Marks the source as fetched, adopting the page title if there is
    /// one. Does nothing once a status has been recorded.
    pub(crate) fn mark_fetched(&mut self, page_title: Option<&str>) {
        if self.status != FetchStatus::Pending {
            return;
        }
        self.status = FetchStatus::Fetched;
        if let Some(title) = page_title.map(str::trim).filter(|t| !t.is_empty())
        {
            self.title = title.to_owned();
        }
    }

    /// Marks the source as failed. Does nothing once a status has been
    /// recorded.
    pub(crate) fn mark_failed(&mut self) {
        if self.status == FetchStatus::Pending {
            self.status = FetchStatus::Failed;
        }
    }
}

fn display_host(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let host = url.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_owned())
}

/// One pass of the research loop.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Iteration {
    /// The query used for this pass.
    pub query: String,
    /// The sources examined, in selection order.
    pub sources: Vec<Source>,
    /// Findings extracted from the fetched content.
    #[serde(rename = "bulletPoints")]
    pub findings: Vec<String>,
    /// Confidence that the findings answer the request, `0..=100`.
    pub confidence: u8,
    /// Why the oracle gave that confidence.
    pub reasoning: String,
}

impl Iteration {
    #[inline]
    pub(crate) fn new(query: String) -> Self {
        Self {
            query,
            ..Default::default()
        }
    }
}

/// The final value of a research run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    /// Whether any findings were collected.
    pub answered: bool,
    /// The synthesized answer, or [`NOT_FOUND_TEXT`].
    pub final_summary: String,
    /// Every completed iteration, in order.
    pub iterations: Vec<Iteration>,
    /// Every source seen across iterations, in first-seen order.
    pub sources: Vec<Source>,
}

impl ResearchResult {
    /// Returns all findings in iteration order.
    pub fn findings(&self) -> impl Iterator<Item = &str> {
        self.iterations
            .iter()
            .flat_map(|it| it.findings.iter().map(String::as_str))
    }

    /// Returns how many sources were fetched successfully.
    pub fn fetched_source_count(&self) -> usize {
        self.sources.iter().filter(|s| s.is_fetched()).count()
    }

    /// Returns a one-line provenance note for the answer.
    pub fn provenance(&self) -> String {
        let iterations = self.iterations.len();
        format!(
            "Based on {} analyzed sources from {iterations} search iteration{}.",
            self.fetched_source_count(),
            if iterations > 1 { "s" } else { "" },
        )
    }
}
