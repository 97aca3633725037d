use crate::research::{Iteration, ResearchResult, Source};
use crate::snapshot::{Phase, Snapshot};

/// Everything a run accumulates between planning and synthesis.
pub(super) struct ResearchState {
    query: String,
    iterations: Vec<Iteration>,
    sources: Vec<Source>,
    running_max_confidence: u8,
}

impl ResearchState {
    #[inline]
    pub fn new(query: String) -> Self {
        Self {
            query,
            iterations: vec![],
            sources: vec![],
            running_max_confidence: 0,
        }
    }

    #[inline]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[inline]
    pub fn set_query(&mut self, query: String) {
        self.query = query;
    }

    #[inline]
    pub fn running_max_confidence(&self) -> u8 {
        self.running_max_confidence
    }

    /// Merges a joined batch into the provenance trail.
    ///
    /// Sources are keyed by URL. A repeated URL keeps its first record
    /// unless only the newer attempt succeeded.
    pub fn record_sources(&mut self, batch: &[Source]) {
        for source in batch {
            match self.sources.iter_mut().find(|s| s.url() == source.url()) {
                Some(known) if !known.is_fetched() && source.is_fetched() => {
                    *known = source.clone();
                }
                Some(_) => {}
                None => self.sources.push(source.clone()),
            }
        }
    }

    pub fn complete(&mut self, iteration: Iteration) {
        self.running_max_confidence =
            self.running_max_confidence.max(iteration.confidence);
        self.iterations.push(iteration);
    }

    pub fn findings(&self) -> impl Iterator<Item = &str> {
        self.iterations
            .iter()
            .flat_map(|it| it.findings.iter().map(String::as_str))
    }

    #[inline]
    pub fn has_findings(&self) -> bool {
        self.findings().next().is_some()
    }

    pub fn snapshot(
        &self,
        request: &str,
        phase: Phase,
        current: Option<&Iteration>,
        is_searching: bool,
    ) -> Snapshot {
        let mut iterations = self.iterations.clone();
        iterations.extend(current.cloned());
        Snapshot {
            phase,
            request: request.to_owned(),
            iterations,
            is_searching,
            final_summary: None,
            all_sources: None,
        }
    }

    pub fn final_snapshot(&self, request: &str, summary: &str) -> Snapshot {
        Snapshot {
            final_summary: Some(summary.to_owned()),
            all_sources: Some(self.sources.clone()),
            ..self.snapshot(request, Phase::Done, None, false)
        }
    }

    pub fn into_result(self, answered: bool, summary: String) -> ResearchResult {
        ResearchResult {
            answered,
            final_summary: summary,
            iterations: self.iterations,
            sources: self.sources,
        }
    }
}
