use std::collections::HashMap;
use std::fmt::{self, Debug};

use bookbot_model::{ModelTool, ToolCallRequest};

use super::object::{BoxedExecution, ToolObject, ToolObjectImpl};
use super::{Error, Tool};
use crate::turn::TurnOutcome;

/// An object that manages the toolset and turns requests from the model
/// into runnable calls.
#[derive(Default)]
pub struct Manager {
    tools: HashMap<String, Box<dyn ToolObject>>,
}

impl Manager {
    /// Registers a tool, replacing any tool with the same name.
    pub fn add_tool<T: Tool>(&mut self, tool: T) {
        let name = tool.name().to_owned();
        self.tools.insert(name, Box::new(ToolObjectImpl(tool)));
    }

    /// Returns the definitions sent to the model, ordered by name.
    pub fn definitions(&self) -> Vec<ModelTool> {
        let mut definitions: Vec<_> = self
            .tools
            .values()
            .map(|tool| ModelTool {
                name: tool.name().to_owned(),
                description: tool.description().to_owned(),
                parameters: tool.parameter_schema().clone(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Checks a request from the model and prepares the call. Nothing
    /// runs until [`PreparedCall::run`] is awaited.
    pub fn prepare(&self, req: ToolCallRequest) -> Result<PreparedCall, Error> {
        let span = debug_span!("tool manager", tool = %req.name);
        let _enter = span.enter();

        let Some(tool) = self.tools.get(&req.name) else {
            warn!("tool not found: {}", req.name);
            return Err(Error::unknown_tool().with_reason(req.name));
        };
        trace!(
            "preparing a tool ({}) with args: {:?}",
            req.id,
            req.arguments
        );
        let (placeholder, execution) = tool.prepare(req.arguments)?;
        Ok(PreparedCall {
            id: req.id,
            name: req.name,
            placeholder,
            execution,
        })
    }
}

/// A validated tool call that has not run yet.
pub struct PreparedCall {
    id: String,
    name: String,
    placeholder: String,
    execution: BoxedExecution,
}

impl PreparedCall {
    /// The call identifier assigned by the model.
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The tool name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The assistant message describing this call.
    #[inline]
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Runs the tool. Returns the placeholder and the outcome.
    pub async fn run(self) -> (String, TurnOutcome) {
        let outcome = self.execution.await;
        (self.placeholder, outcome)
    }
}

impl Debug for PreparedCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreparedCall")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("placeholder", &self.placeholder)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::future::ready;

    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::tool::ErrorKind;

    static EMPTY_SCHEMA: &Value = &Value::Null;

    #[derive(Deserialize)]
    struct EchoInput {
        word: String,
    }

    struct EchoTool;

    impl Tool for EchoTool {
        type Input = EchoInput;

        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echoes a word"
        }

        fn parameter_schema(&self) -> &Value {
            EMPTY_SCHEMA
        }

        fn validate(&self, input: &Self::Input) -> Result<(), Error> {
            if input.word.is_empty() {
                return Err(Error::invalid_input().with_reason("empty word"));
            }
            Ok(())
        }

        fn placeholder(&self, input: &Self::Input) -> String {
            format!("Echoing {}", input.word)
        }

        fn execute(
            &self,
            _input: Self::Input,
        ) -> impl Future<Output = TurnOutcome> + Send + 'static {
            ready(TurnOutcome::Text)
        }
    }

    fn request(name: &str, arguments: Value) -> ToolCallRequest {
        ToolCallRequest {
            id: "tool:1".to_owned(),
            name: name.to_owned(),
            arguments,
        }
    }

    #[test]
    fn test_definitions() {
        let mut manager = Manager::default();
        manager.add_tool(EchoTool);

        let definitions = manager.definitions();
        assert_eq!(definitions.len(), 1);
        assert_eq!(definitions[0].name, "echo");
        assert_eq!(definitions[0].description, "Echoes a word");
    }

    #[tokio::test]
    async fn test_prepare_and_run() {
        let mut manager = Manager::default();
        manager.add_tool(EchoTool);

        let call = manager
            .prepare(request("echo", json!({ "word": "hi" })))
            .unwrap();
        assert_eq!(call.id(), "tool:1");
        assert_eq!(call.name(), "echo");
        assert_eq!(call.placeholder(), "Echoing hi");
        let (reply, outcome) = call.run().await;
        assert_eq!(reply, "Echoing hi");
        assert_eq!(outcome, TurnOutcome::Text);
    }

    #[test]
    fn test_invalid_requests() {
        let mut manager = Manager::default();
        manager.add_tool(EchoTool);

        let err =
            manager.prepare(request("read_file", json!({}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownTool);
        assert_eq!(err.reason(), "read_file");

        let err = manager.prepare(request("echo", json!({}))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = manager
            .prepare(request("echo", json!({ "word": "" })))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.reason(), "empty word");

        let err = manager
            .prepare(request("echo", Value::String("{word:".to_owned())))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
