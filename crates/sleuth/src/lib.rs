//! A research agent for the terminal.
//!
//! The crate wires the OpenAI-compatible model provider and the Firecrawl
//! fetcher into a [`Session`], and ships a CLI that prints progress while a
//! question is being researched. It can also be used as a library to bring
//! research into your own host apps.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

pub mod render;
mod session;
pub mod settings;

pub use session::{Input, Session, SessionBuilder};

/// Re-exports of [`sleuth_core`] crate.
pub mod core {
    pub use sleuth_core::*;
}
