//! A conversational assistant that helps people find books.
//!
//! The crate includes a CLI tool for using in the terminal. It can also be
//! used as a library: build a [`Session`] with any model provider, send it
//! messages and render what comes back with [`render::Renderer`].

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

pub mod render;
mod session;
pub mod tools;

pub use session::{DEFAULT_SYSTEM_PROMPT, Session, SessionBuilder};

/// Re-exports of [`bookbot_core`] crate.
pub mod core {
    pub use bookbot_core::*;
}

/// Re-exports of [`bookbot_books`] crate.
pub mod books {
    pub use bookbot_books::*;
}
