use bookbot_books::{
    BooksClient, BooksConfigBuilder, Error as BooksError, SearchPage,
    SearchParameters,
};
use bookbot_core::conversation::{Conversation, Item};
use bookbot_core::{Dispatcher, DispatcherBuilder, TurnError};
use bookbot_model::ModelProvider;

use crate::tools::*;

/// The instruction sent in front of every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("./system_prompt.md");

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    dispatcher_builder: DispatcherBuilder,
    books: Option<BooksClient>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider and the
    /// default system prompt.
    pub fn with_model_provider<M: ModelProvider + 'static>(
        provider: M,
    ) -> Self {
        let dispatcher_builder =
            DispatcherBuilder::with_model_provider(provider)
                .with_system_prompt(DEFAULT_SYSTEM_PROMPT);
        Self {
            dispatcher_builder,
            books: None,
        }
    }

    /// Replaces the system prompt.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.dispatcher_builder =
            self.dispatcher_builder.with_system_prompt(prompt);
        self
    }

    /// Sets the client used by the book tools. Without one, a client with
    /// the default configuration is created.
    #[inline]
    pub fn with_books_client(mut self, books: BooksClient) -> Self {
        self.books = Some(books);
        self
    }

    /// Attaches a callback that receives assistant text as it streams.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(&str) + Send + Sync + 'static,
    ) -> Self {
        self.dispatcher_builder = self
            .dispatcher_builder
            .on_transcript(move |delta| on_transcript(&delta));
        self
    }

    /// Builds a new session.
    pub fn build(self) -> Result<Session, BooksError> {
        let books = match self.books {
            Some(books) => books,
            None => BooksClient::new(BooksConfigBuilder::new().build())?,
        };
        let dispatcher = self
            .dispatcher_builder
            .with_tool(SearchTool::new(books.clone()))
            .with_tool(DetailTool::new(books.clone()))
            .build();

        Ok(Session {
            dispatcher,
            books,
            conversation: Conversation::default(),
        })
    }
}

/// A chat session about books.
///
/// Turns run one at a time: [`Session::send_message`] borrows the session
/// mutably until the turn is over. A turn is recorded only when the
/// model answered; paging through results never touches the
/// conversation.
pub struct Session {
    dispatcher: Dispatcher,
    books: BooksClient,
    conversation: Conversation,
}

impl Session {
    /// Sends a message and returns the assistant item it produced.
    pub async fn send_message(
        &mut self,
        message: &str,
    ) -> Result<&Item, TurnError> {
        let turn = self
            .dispatcher
            .handle_turn(&self.conversation, message)
            .await?;
        trace!("committing a turn: {:?}", turn.outcome);
        Ok(self.conversation.commit(turn))
    }

    /// Fetches another page of an earlier search.
    pub async fn change_page(
        &self,
        params: &SearchParameters,
        offset: u32,
    ) -> Result<SearchPage, BooksError> {
        self.books.search(params, offset).await
    }

    /// Asks for the details of a search result. This is a regular turn.
    pub async fn select_item(
        &mut self,
        book_id: &str,
    ) -> Result<&Item, TurnError> {
        let message = select_item_message(book_id);
        self.send_message(&message).await
    }

    /// Returns the conversation so far.
    #[inline]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Ends the session and hands back the conversation.
    #[inline]
    pub fn close(self) -> Conversation {
        self.conversation
    }
}

fn select_item_message(book_id: &str) -> String {
    format!("Show me the details of the book with ID \"{book_id}\".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_item_message() {
        assert_eq!(
            select_item_message("abc123"),
            "Show me the details of the book with ID \"abc123\"."
        );
    }
}
