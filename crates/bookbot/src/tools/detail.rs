use bookbot_books::BooksClient;
use bookbot_core::TurnOutcome;
use bookbot_core::tool::{Error as ToolError, Tool};
use schemars::{JsonSchema, schema_for};
use serde::Deserialize;
use serde_json::Value;

/// Arguments of the `detail` tool.
#[derive(Clone, Debug, Deserialize, JsonSchema)]
pub struct DetailToolParameters {
    #[schemars(description = "ID of the book to retrieve details for")]
    #[serde(rename = "bookId")]
    book_id: String,
}

/// Looks up one book by its identifier.
pub struct DetailTool {
    books: BooksClient,
    parameter_schema: Value,
}

impl DetailTool {
    /// Creates a detail tool backed by `books`.
    #[inline]
    pub fn new(books: BooksClient) -> Self {
        DetailTool {
            books,
            parameter_schema: schema_for!(DetailToolParameters).to_value(),
        }
    }
}

impl Tool for DetailTool {
    type Input = DetailToolParameters;

    fn name(&self) -> &str {
        "detail"
    }

    fn description(&self) -> &str {
        "Get detailed information about a specific book using its ID"
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn validate(&self, input: &Self::Input) -> Result<(), ToolError> {
        if input.book_id.trim().is_empty() {
            return Err(
                ToolError::invalid_input().with_reason("`bookId` is empty")
            );
        }
        Ok(())
    }

    fn placeholder(&self, input: &Self::Input) -> String {
        format!("Looking up details for book \"{}\"", input.book_id.trim())
    }

    #[allow(clippy::manual_async_fn)]
    fn execute(
        &self,
        input: DetailToolParameters,
    ) -> impl Future<Output = TurnOutcome> + Send + 'static {
        let books = self.books.clone();
        async move {
            let book_id = input.book_id.trim().to_owned();
            let result = books.detail(&book_id).await;
            if let Err(err) = &result {
                warn!("detail lookup failed: {err}");
            }
            TurnOutcome::Detail { book_id, result }
        }
    }
}

#[cfg(test)]
mod tests {
    use bookbot_books::{BooksConfigBuilder, Error as BooksError};
    use bookbot_core::tool::ErrorKind;
    use serde_json::json;

    use super::*;

    fn tool() -> DetailTool {
        let config = BooksConfigBuilder::new()
            .with_base_url("http://127.0.0.1:9")
            .build();
        DetailTool::new(BooksClient::new(config).unwrap())
    }

    #[test]
    fn test_schema_requires_book_id() {
        let tool = tool();
        assert_eq!(tool.parameter_schema()["required"], json!(["bookId"]));
    }

    #[test]
    fn test_validate() {
        let tool = tool();
        let input: DetailToolParameters =
            serde_json::from_value(json!({ "bookId": "abc123" })).unwrap();
        assert!(tool.validate(&input).is_ok());
        assert_eq!(
            tool.placeholder(&input),
            "Looking up details for book \"abc123\""
        );

        let input: DetailToolParameters =
            serde_json::from_value(json!({ "bookId": "  " })).unwrap();
        let err = tool.validate(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_outcome() {
        let outcome = tool()
            .execute(DetailToolParameters {
                book_id: "abc123".to_owned(),
            })
            .await;
        let TurnOutcome::Detail { book_id, result } = outcome else {
            panic!("expected a detail outcome");
        };
        assert_eq!(book_id, "abc123");
        assert!(matches!(result, Err(BooksError::DetailUnavailable(_))));
    }
}
