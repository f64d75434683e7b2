use thiserror::Error;

/// Errors returned by [`BooksClient`](crate::BooksClient).
///
/// None of them are fatal: they are meant to be shown where the result
/// would have appeared.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The search request failed, timed out, or returned something that
    /// is not a result page.
    #[error("book search is unavailable: {0}")]
    SearchUnavailable(String),
    /// The API answered the detail request with an error payload.
    #[error("book not found: {0}")]
    DetailNotFound(String),
    /// The detail request failed, timed out, or returned garbage.
    #[error("book details are unavailable: {0}")]
    DetailUnavailable(String),
    /// A detail request was made without a book identifier.
    #[error("a book identifier is required")]
    EmptyBookId,
    /// The HTTP client could not be created.
    #[error("cannot initialize the HTTP client: {0}")]
    Setup(String),
}

pub(crate) fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_owned()
    } else {
        err.to_string()
    }
}
