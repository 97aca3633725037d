//! Progress snapshots and the sinks that receive them.

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::research::{Iteration, Source};

/// The phase a snapshot was taken after.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// The request has been turned into a query.
    Planning,
    /// A new iteration started.
    Searching,
    /// Candidates were selected and are being fetched.
    Scraping,
    /// Fetches joined, findings are being extracted.
    Summarizing,
    /// Findings are being assessed.
    Assessing,
    /// The iteration was appended to the history.
    IterationDone,
    /// The final answer is ready.
    Done,
}

/// An immutable view of a research run.
///
/// `iterations` holds the completed iterations followed by the one in
/// progress, if any.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// The phase that just completed.
    pub phase: Phase,
    /// The raw request text.
    pub request: String,
    /// Iterations so far.
    pub iterations: Vec<Iteration>,
    /// Whether more work is expected before the final answer.
    pub is_searching: bool,
    /// The final answer, only set in [`Phase::Done`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_summary: Option<String>,
    /// Every source seen, only set in [`Phase::Done`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_sources: Option<Vec<Source>>,
}

/// A sink for progress snapshots.
///
/// Reporters are called synchronously from the research task and should
/// return quickly. A panicking reporter is logged and otherwise ignored.
pub trait ProgressReporter: Send + Sync {
    /// Receives the next snapshot.
    fn report(&self, snapshot: &Snapshot);
}

impl<F> ProgressReporter for F
where
    F: Fn(&Snapshot) + Send + Sync,
{
    #[inline]
    fn report(&self, snapshot: &Snapshot) {
        self(snapshot)
    }
}

/// A reporter that forwards snapshots into an unbounded channel.
#[derive(Clone, Debug)]
pub struct ChannelReporter {
    tx: mpsc::UnboundedSender<Snapshot>,
}

impl ProgressReporter for ChannelReporter {
    #[inline]
    fn report(&self, snapshot: &Snapshot) {
        // The receiver going away only means nobody is watching anymore.
        self.tx.send(snapshot.clone()).ok();
    }
}

/// Creates a reporter and the stream of snapshots it produces.
#[inline]
pub fn channel() -> (ChannelReporter, mpsc::UnboundedReceiver<Snapshot>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelReporter { tx }, rx)
}

pub(crate) fn deliver(reporter: &dyn ProgressReporter, snapshot: &Snapshot) {
    let delivered =
        catch_unwind(AssertUnwindSafe(|| reporter.report(snapshot)));
    if delivered.is_err() {
        warn!("progress reporter panicked at {:?}, ignoring", snapshot.phase);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn snapshot(phase: Phase) -> Snapshot {
        Snapshot {
            phase,
            request: "What is Firecrawl?".to_owned(),
            iterations: vec![],
            is_searching: true,
            final_summary: None,
            all_sources: None,
        }
    }

    #[test]
    fn test_shape() {
        assert_eq!(
            serde_json::to_value(snapshot(Phase::IterationDone)).unwrap(),
            json!({
                "phase": "iterationDone",
                "request": "What is Firecrawl?",
                "iterations": [],
                "isSearching": true
            })
        );

        let mut done = snapshot(Phase::Done);
        done.is_searching = false;
        done.final_summary = Some("Firecrawl scrapes.".to_owned());
        done.all_sources = Some(vec![Source::new("https://firecrawl.dev")]);
        assert_eq!(
            serde_json::to_value(done).unwrap(),
            json!({
                "phase": "done",
                "request": "What is Firecrawl?",
                "iterations": [],
                "isSearching": false,
                "finalSummary": "Firecrawl scrapes.",
                "allSources": [{
                    "url": "https://firecrawl.dev",
                    "title": "firecrawl.dev",
                    "status": "pending"
                }]
            })
        );
    }

    #[tokio::test]
    async fn test_channel() {
        let (reporter, mut rx) = channel();
        deliver(&reporter, &snapshot(Phase::Planning));
        deliver(&reporter, &snapshot(Phase::Searching));
        assert_eq!(rx.recv().await.unwrap().phase, Phase::Planning);
        assert_eq!(rx.recv().await.unwrap().phase, Phase::Searching);

        drop(rx);
        deliver(&reporter, &snapshot(Phase::Done));
    }

    fn panicking_reporter(_: &Snapshot) {
        panic!("display went away");
    }

    #[test]
    fn test_panicking_reporter() {
        deliver(&panicking_reporter, &snapshot(Phase::Planning));
    }
}
