use std::pin::Pin;

use serde_json::Value;

use super::{Error, Tool};
use crate::turn::TurnOutcome;

pub(crate) type BoxedExecution =
    Pin<Box<dyn Future<Output = TurnOutcome> + Send>>;

pub(crate) trait ToolObject: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn parameter_schema(&self) -> &Value;

    /// Decodes and validates the arguments, returning the placeholder
    /// message and the pending execution.
    fn prepare(
        &self,
        arguments: Value,
    ) -> Result<(String, BoxedExecution), Error>;
}

pub(crate) struct ToolObjectImpl<T: Tool>(pub T);

impl<T: Tool> ToolObject for ToolObjectImpl<T> {
    #[inline]
    fn name(&self) -> &str {
        self.0.name()
    }

    #[inline]
    fn description(&self) -> &str {
        self.0.description()
    }

    #[inline]
    fn parameter_schema(&self) -> &Value {
        self.0.parameter_schema()
    }

    fn prepare(
        &self,
        arguments: Value,
    ) -> Result<(String, BoxedExecution), Error> {
        let input: T::Input =
            serde_json::from_value(arguments).map_err(|err| {
                Error::invalid_input().with_reason(format!("{err}"))
            })?;
        self.0.validate(&input)?;
        let placeholder = self.0.placeholder(&input);
        Ok((placeholder, Box::pin(self.0.execute(input))))
    }
}
