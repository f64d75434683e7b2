use serde_json::Value;

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelRequest {
    /// The input messages, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Tools that are available to the model.
    pub tools: Vec<ModelTool>,
}

impl ModelRequest {
    /// Creates a request that starts with the given system instruction.
    pub fn with_system<S: Into<String>>(instruction: S) -> Self {
        Self {
            messages: vec![ModelMessage::System(instruction.into())],
            tools: vec![],
        }
    }

    /// Returns the number of conversation messages, not counting system
    /// instructions.
    pub fn conversation_len(&self) -> usize {
        self.messages
            .iter()
            .filter(|msg| !matches!(msg, ModelMessage::System(_)))
            .count()
    }
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
}

/// Describes a tool that can be used by the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ModelTool {
    /// Name of the tool.
    pub name: String,
    /// Description of the tool.
    pub description: String,
    /// Parameters definition of the tool, as a
    /// [JSON schema](https://json-schema.org/).
    pub parameters: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_len_skips_system() {
        let mut req = ModelRequest::with_system("Only talk about books.");
        assert_eq!(req.conversation_len(), 0);

        req.messages.push(ModelMessage::User("Hi".to_owned()));
        req.messages
            .push(ModelMessage::Assistant("Hello, reader!".to_owned()));
        assert_eq!(req.messages.len(), 3);
        assert_eq!(req.conversation_len(), 2);
    }
}
