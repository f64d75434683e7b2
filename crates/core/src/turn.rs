use bookbot_books::{
    BookDetail, Error as BooksError, SearchPage, SearchParameters,
};
use bookbot_model::ErrorKind;
use thiserror::Error;

/// What a turn produced, besides the assistant text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The model answered in plain text.
    Text,
    /// The model searched for books. The parameters are kept so the page
    /// can be changed later.
    Search {
        /// Filters the model chose.
        params: SearchParameters,
        /// The first page, or why it could not be fetched.
        result: Result<SearchPage, BooksError>,
    },
    /// The model looked up one book.
    Detail {
        /// The requested identifier.
        book_id: String,
        /// The record, or why it could not be fetched.
        result: Result<BookDetail, BooksError>,
    },
}

impl TurnOutcome {
    /// Returns the downstream error carried by this outcome, if any.
    pub fn error(&self) -> Option<&BooksError> {
        match self {
            TurnOutcome::Text => None,
            TurnOutcome::Search { result, .. } => result.as_ref().err(),
            TurnOutcome::Detail { result, .. } => result.as_ref().err(),
        }
    }
}

/// A completed turn, ready to be committed to a
/// [`Conversation`](crate::conversation::Conversation).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    /// The user's message.
    pub utterance: String,
    /// The assistant's message: the streamed text, or a short note
    /// describing the tool call.
    pub reply: String,
    /// What the turn produced.
    pub outcome: TurnOutcome,
}

/// Errors that abort a turn. A failed turn leaves the conversation
/// untouched and can be retried by sending the same message again.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TurnError {
    /// The model could not be reached or did not produce a usable answer.
    #[error("the assistant is unavailable ({kind}): {message}")]
    ModelUnavailable {
        /// What went wrong on the provider side.
        kind: ErrorKind,
        /// Details for logs and for the user.
        message: String,
    },
    /// The message was empty or only whitespace.
    #[error("the message is empty")]
    EmptyUtterance,
}
