//! A provider-neutral protocol for talking to chat completion models.
//!
//! The types here describe what the book assistant sends to a model (the
//! system instruction, the replayed conversation and the callable tools)
//! and what it expects back (a stream of text deltas and tool calls).
//!
//! Nothing in this crate performs I/O. Concrete providers live in their
//! own crates and implement [`ModelProvider`].

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
