use bookbot_books::{BooksClient, SearchParameters};
use bookbot_core::TurnOutcome;
use bookbot_core::tool::Tool;
use schemars::schema_for;
use serde_json::Value;

/// Searches books and shows the first page of results.
pub struct SearchTool {
    books: BooksClient,
    parameter_schema: Value,
}

impl SearchTool {
    /// Creates a search tool backed by `books`.
    #[inline]
    pub fn new(books: BooksClient) -> Self {
        SearchTool {
            books,
            parameter_schema: schema_for!(SearchParameters).to_value(),
        }
    }
}

impl Tool for SearchTool {
    type Input = SearchParameters;

    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search and display books using various search filters like title, \
         author, subject, etc."
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn placeholder(&self, input: &Self::Input) -> String {
        format!("Searching books for \"{}\"", input.summary())
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        params: SearchParameters,
    ) -> impl Future<Output = TurnOutcome> + Send + 'static {
        let books = self.books.clone();
        async move {
            let result = books.search(&params, 0).await;
            if let Err(err) = &result {
                warn!("search failed: {err}");
            }
            TurnOutcome::Search { params, result }
        }
    }
}
