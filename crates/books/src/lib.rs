//! A client for the Google Books `volumes` API.
//!
//! [`SearchParameters`] turns named filters into the `q` query the API
//! understands, [`BooksClient`] fetches pages of results and single
//! records, and [`Pagination`] holds the page arithmetic shared by
//! everything that renders a [`SearchPage`].

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod client;
mod config;
mod error;
mod page;
mod query;
mod volume;

pub use client::BooksClient;
pub use config::{BooksConfig, BooksConfigBuilder};
pub use error::Error;
pub use page::{PAGE_SIZE, Pagination};
pub use query::SearchParameters;
pub use volume::{BookDetail, SearchPage, SearchResultItem};
