mod builder;
mod state;

use futures_util::future::join_all;
use tracing::Instrument;

use crate::article::{ArticleAnalysis, page_title};
use crate::cancel::Cancellation;
use crate::error::Error;
use crate::fetch::FetchClient;
use crate::oracle::{Oracle, OracleError};
use crate::prompt::{SourceContent, truncate_chars};
use crate::research::{
    Iteration, NOT_FOUND_TEXT, ResearchRequest, ResearchResult, Source,
};
use crate::selector::RoutingTable;
use crate::snapshot::{self, Phase, ProgressReporter, Snapshot};
pub use builder::EngineBuilder;
use state::ResearchState;

/// The research engine.
///
/// An engine holds no per-run state, so one instance can serve any number
/// of sequential or concurrent runs. Each run is driven by a single task:
/// fetches within an iteration fan out concurrently, everything else
/// happens in order.
pub struct Engine {
    oracle: Oracle,
    fetch_client: FetchClient,
    routing_table: RoutingTable,
    reporter: Option<Box<dyn ProgressReporter>>,
    content_prefix: usize,
    max_findings: usize,
    article_prefix: usize,
}

enum Flow {
    Continue(String),
    Stop,
}

impl Engine {
    /// Researches `request` until the confidence threshold or the
    /// iteration budget is reached.
    ///
    /// Failed fetches and unusable replies degrade the result instead of
    /// failing the run. An error is returned only when a required oracle
    /// call gives up.
    #[inline]
    pub async fn run(
        &self,
        request: ResearchRequest,
    ) -> Result<ResearchResult, Error> {
        self.run_with_cancellation(request, Cancellation::default())
            .await
    }

    /// Like [`Engine::run`], but gives up with a `Cancelled` error once
    /// `cancellation` fires.
    pub async fn run_with_cancellation(
        &self,
        request: ResearchRequest,
        cancellation: Cancellation,
    ) -> Result<ResearchResult, Error> {
        let span = info_span!("research", request = request.text());
        self.research(&request, &cancellation).instrument(span).await
    }

    /// Fetches a single page and asks the oracle to summarize it.
    pub async fn analyze_article(
        &self,
        url: &str,
    ) -> Result<ArticleAnalysis, Error> {
        let page = self.fetch_client.fetch(url).await.map_err(|err| {
            Error::source_unavailable().with_reason(err.to_string())
        })?;
        if page.content.trim().is_empty() {
            return Err(Error::source_unavailable()
                .with_reason(format!("{url} has no readable content")));
        }

        let content = truncate_chars(&page.content, self.article_prefix);
        let digest = self
            .oracle
            .analyze_article(page_title(&page), url, content)
            .await
            .map_err(oracle_unavailable)?;
        info!("analyzed {url}");
        Ok(ArticleAnalysis::new(url, page, digest))
    }

    async fn research(
        &self,
        request: &ResearchRequest,
        cancellation: &Cancellation,
    ) -> Result<ResearchResult, Error> {
        cancellation.check("planning")?;
        let plan = self
            .oracle
            .plan(request.text())
            .await
            .map_err(oracle_unavailable)?;
        let query = plan.query.unwrap_or_else(|| {
            debug!("no query in the plan, using the request verbatim");
            request.text().to_owned()
        });
        info!(
            "planned query {query:?} (topics: {}, type: {})",
            plan.topics.as_deref().unwrap_or("-"),
            plan.kind.as_deref().unwrap_or("-"),
        );

        let mut state = ResearchState::new(query);
        self.report(|| {
            state.snapshot(request.text(), Phase::Planning, None, true)
        });

        let threshold = request.confidence_threshold();
        let mut index = 0;
        while index < request.max_iterations()
            && state.running_max_confidence() < threshold
        {
            cancellation.check("the next iteration")?;
            let flow = self
                .iterate(request, &mut state, index, cancellation)
                .instrument(debug_span!("iteration", index))
                .await?;
            match flow {
                Flow::Continue(next_query) => {
                    debug!("refined query: {next_query:?}");
                    state.set_query(next_query);
                }
                Flow::Stop => break,
            }
            index += 1;
        }

        if !state.has_findings() {
            info!("no findings collected");
            self.report(|| state.final_snapshot(request.text(), NOT_FOUND_TEXT));
            return Ok(state.into_result(false, NOT_FOUND_TEXT.to_owned()));
        }

        cancellation.check("synthesis")?;
        let summary = self
            .oracle
            .synthesize(request.text(), state.findings())
            .await
            .map_err(oracle_unavailable)?;
        info!("research finished, {} findings", state.findings().count());
        self.report(|| state.final_snapshot(request.text(), &summary));
        Ok(state.into_result(true, summary))
    }

    async fn iterate(
        &self,
        request: &ResearchRequest,
        state: &mut ResearchState,
        index: usize,
        cancellation: &Cancellation,
    ) -> Result<Flow, Error> {
        let text = request.text();
        let mut iteration = Iteration::new(state.query().to_owned());
        self.report(|| {
            state.snapshot(text, Phase::Searching, Some(&iteration), true)
        });

        let candidates =
            self.routing_table
                .select(state.query(), index, request.limit());
        if candidates.is_empty() {
            debug!("no candidates left for {:?}", state.query());
            return Ok(Flow::Stop);
        }
        iteration.sources = candidates;
        self.report(|| {
            state.snapshot(text, Phase::Scraping, Some(&iteration), true)
        });

        let contents = self.fetch_sources(&mut iteration.sources).await;
        state.record_sources(&iteration.sources);
        self.report(|| {
            state.snapshot(text, Phase::Summarizing, Some(&iteration), true)
        });

        if !contents.is_empty() {
            cancellation.check("extraction")?;
            let extracted = self
                .oracle
                .extract_findings(
                    text,
                    &contents,
                    self.content_prefix,
                    self.max_findings,
                )
                .await;
            match extracted {
                Ok(findings) => iteration.findings = findings,
                Err(err) => {
                    warn!("extraction failed, ending the research: {err}");
                    return Ok(Flow::Stop);
                }
            }
        }
        self.report(|| {
            state.snapshot(text, Phase::Assessing, Some(&iteration), true)
        });

        cancellation.check("assessment")?;
        let threshold = request.confidence_threshold();
        let assessment = self
            .oracle
            .assess(text, &iteration.findings, threshold)
            .await
            .map_err(oracle_unavailable)?;
        info!(
            "iteration {index}: {} findings, confidence {}",
            iteration.findings.len(),
            assessment.confidence
        );
        iteration.confidence = assessment.confidence;
        iteration.reasoning = assessment.reasoning;
        state.complete(iteration);

        let below_threshold = state.running_max_confidence() < threshold;
        let more = index + 1 < request.max_iterations() && below_threshold;
        self.report(|| state.snapshot(text, Phase::IterationDone, None, more));

        match assessment.next_query {
            Some(next_query) if below_threshold => {
                Ok(Flow::Continue(next_query))
            }
            _ => Ok(Flow::Stop),
        }
    }

    /// Fetches every source concurrently and records the outcomes once
    /// all of them have settled. Returns the usable contents in selection
    /// order.
    async fn fetch_sources(&self, sources: &mut [Source]) -> Vec<SourceContent> {
        let fetches = sources.iter().map(|s| self.fetch_client.fetch(s.url()));
        let outcomes = join_all(fetches).await;

        let mut contents = vec![];
        for (source, outcome) in sources.iter_mut().zip(outcomes) {
            match outcome {
                Ok(page) => {
                    source.mark_fetched(page.title.as_deref());
                    if page.content.trim().is_empty() {
                        debug!("{} has no content", source.url());
                        continue;
                    }
                    contents.push(SourceContent {
                        title: source.title().to_owned(),
                        content: page.content,
                    });
                }
                Err(err) => {
                    warn!("failed to fetch {}: {err}", source.url());
                    source.mark_failed();
                }
            }
        }
        debug!("{} of {} sources usable", contents.len(), sources.len());
        contents
    }

    fn report(&self, snapshot: impl FnOnce() -> Snapshot) {
        if let Some(reporter) = &self.reporter {
            snapshot::deliver(reporter.as_ref(), &snapshot());
        }
    }
}

#[inline]
fn oracle_unavailable(err: OracleError) -> Error {
    Error::oracle_unavailable().with_reason(err.to_string())
}
