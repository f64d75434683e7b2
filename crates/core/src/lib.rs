//! The turn loop of the book assistant: conversation state, tool
//! dispatch, and the glue between a model provider and the book tools.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod conversation;
mod dispatch;
mod model_client;
pub mod tool;
mod turn;

pub use dispatch::{Dispatcher, DispatcherBuilder, ModelDecision};
pub use turn::{Turn, TurnError, TurnOutcome};
