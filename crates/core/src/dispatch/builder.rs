use std::sync::Arc;

use bookbot_model::ModelProvider;

use super::Dispatcher;
use crate::model_client::ModelClient;
use crate::tool::{self, Tool};

/// [`Dispatcher`] builder.
pub struct DispatcherBuilder {
    model_client: ModelClient,
    tools: tool::Manager,
    system_prompt: String,
    on_transcript: Option<super::TranscriptFn>,
}

impl DispatcherBuilder {
    /// Creates a new builder with the specified model provider.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            model_client: ModelClient::new(provider),
            tools: Default::default(),
            system_prompt: String::new(),
            on_transcript: None,
        }
    }

    /// Sets the instruction sent in front of every request.
    #[inline]
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Attaches a callback that receives assistant text as it streams.
    #[inline]
    pub fn on_transcript(
        mut self,
        on_transcript: impl Fn(String) + Send + Sync + 'static,
    ) -> Self {
        self.on_transcript = Some(Arc::new(on_transcript));
        self
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.add_tool(tool);
        self
    }

    /// Builds the dispatcher.
    #[inline]
    pub fn build(self) -> Dispatcher {
        let DispatcherBuilder {
            model_client,
            tools,
            system_prompt,
            on_transcript,
        } = self;
        Dispatcher {
            model_client,
            tools,
            system_prompt,
            on_transcript,
        }
    }
}
