//! A minimal contract for text-generation models.
//!
//! The research engine treats a language model as an oracle: it sends a
//! prompt and reads back generated text. This crate pins down that
//! exchange so that hosted APIs, local models and scripted fakes can be
//! swapped without touching the engine.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
