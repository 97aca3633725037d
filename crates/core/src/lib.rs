//! The research loop: planning, source selection, fetching, finding
//! extraction, confidence assessment and synthesis.
//!
//! The engine talks to the outside world through two narrow contracts: a
//! [`sleuth_model::ModelProvider`] that answers prompts, and a
//! [`ContentFetcher`] that retrieves pages. Everything else, including
//! the routing table that decides which pages to look at, is plain data.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod article;
mod cancel;
mod engine;
mod error;
mod fetch;
mod model_client;
mod oracle;
pub mod parse;
mod prompt;
pub mod research;
pub mod selector;
pub mod snapshot;

pub use article::ArticleAnalysis;
pub use cancel::{AbortHandle, Cancellation};
pub use engine::{Engine, EngineBuilder};
pub use error::{Error, ErrorKind};
pub use fetch::{ContentFetcher, FetchedPage};
pub use oracle::RetryPolicy;
pub use research::{
    FetchStatus, Iteration, ResearchRequest, ResearchResult, Source,
};
pub use selector::{Route, RoutingTable};
pub use snapshot::{Phase, ProgressReporter, Snapshot};
