//! Tool call supports.

mod error;
mod manager;
mod object;

use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{Error, ErrorKind};
pub use manager::{Manager, PreparedCall};

use crate::turn::TurnOutcome;

/// A tool that can be called by the model.
///
/// Implementations of this trait should be stateless. Anything the tool
/// needs, such as an HTTP client, is set during initialization and
/// cloned into the future returned by [`Tool::execute`].
pub trait Tool: Send + Sync + 'static {
    /// The type of input that the tool accepts.
    type Input: DeserializeOwned;

    /// Returns the name of the tool.
    fn name(&self) -> &str;

    /// Returns the description of the tool.
    fn description(&self) -> &str;

    /// Returns the parameter schema of the tool.
    fn parameter_schema(&self) -> &Value;

    /// Checks constraints the schema cannot express. The default accepts
    /// every input that deserializes.
    fn validate(&self, input: &Self::Input) -> Result<(), Error> {
        let _ = input;
        Ok(())
    }

    /// Returns the assistant message recorded for this call.
    fn placeholder(&self, input: &Self::Input) -> String;

    /// Executes the tool with the given input.
    ///
    /// Downstream failures are part of the outcome rather than an error,
    /// so they can be shown where the result would have appeared. The
    /// returned future must be fully independent of `self`.
    fn execute(
        &self,
        input: Self::Input,
    ) -> impl Future<Output = TurnOutcome> + Send + 'static;
}
