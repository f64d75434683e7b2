mod builder;

use std::sync::Arc;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::future::retry;
use bookbot_model::{
    ErrorKind, ModelMessage, ModelProviderError, ModelRequest, ModelTool,
    ToolCallRequest,
};
use tracing::Instrument;

pub use builder::DispatcherBuilder;

use crate::conversation::Conversation;
use crate::model_client::{ModelClient, ModelClientResponse};
use crate::tool::{self, PreparedCall};
use crate::turn::{Turn, TurnError, TurnOutcome};

pub(crate) type TranscriptFn = Arc<dyn Fn(String) + Send + Sync>;

/// What the model chose to do with a request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelDecision {
    /// Answer in plain text.
    Text(String),
    /// Call a tool.
    ToolCall(ToolCallRequest),
}

impl ModelDecision {
    /// A tool call wins over text. Only the first tool call is used.
    pub(crate) fn from_response(resp: ModelClientResponse) -> Self {
        let mut tool_calls = resp.tool_calls.into_iter();
        let Some(first) = tool_calls.next() else {
            return ModelDecision::Text(resp.transcript);
        };
        let ignored = tool_calls.count();
        if ignored > 0 {
            warn!(
                "ignoring {ignored} extra tool call(s) after {}",
                first.name
            );
        }
        if !resp.transcript.is_empty() {
            debug!("dropping text sent along with a tool call");
        }
        ModelDecision::ToolCall(first)
    }
}

/// Runs turns: sends the conversation to the model and carries out
/// whatever it decides.
///
/// The dispatcher holds no conversation state. Callers pass the history
/// in and commit the returned [`Turn`] themselves, so a failed turn
/// leaves nothing behind.
pub struct Dispatcher {
    model_client: ModelClient,
    tools: tool::Manager,
    system_prompt: String,
    on_transcript: Option<TranscriptFn>,
}

impl Dispatcher {
    /// Returns the tool definitions offered to the model.
    #[inline]
    pub fn tool_definitions(&self) -> Vec<ModelTool> {
        self.tools.definitions()
    }

    /// Sends one request and reduces the response to a decision.
    pub async fn decide(
        &self,
        req: ModelRequest,
    ) -> Result<ModelDecision, Box<dyn ModelProviderError>> {
        let on_transcript = self.on_transcript.clone();
        let resp = self
            .model_client
            .send_request(req, move |delta| {
                if let Some(on_transcript) = &on_transcript {
                    on_transcript(delta);
                }
            })
            .await?;
        Ok(ModelDecision::from_response(resp))
    }

    /// Runs one turn on top of `conversation`.
    ///
    /// The conversation is not modified; commit the returned turn to
    /// record it. Tool arguments the model gets wrong are asked for once
    /// more with the same request before the turn fails.
    pub async fn handle_turn(
        &self,
        conversation: &Conversation,
        utterance: &str,
    ) -> Result<Turn, TurnError> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return Err(TurnError::EmptyUtterance);
        }

        let request = self.build_request(conversation, utterance);
        let span = debug_span!(
            "turn",
            model = self.model_client.model_name(),
            history = conversation.len()
        );
        async move {
            let request = &request;
            let resolved =
                retry(RetryOnce::default(), move || self.attempt(request))
                    .await
                    .map_err(AttemptError::into_turn_error)?;

            let (reply, outcome) = match resolved {
                Resolved::Text(text) => (text, TurnOutcome::Text),
                Resolved::Call(call) => {
                    debug!("running tool {} ({})", call.name(), call.id());
                    call.run().await
                }
            };
            Ok(Turn {
                utterance: utterance.to_owned(),
                reply,
                outcome,
            })
        }
        .instrument(span)
        .await
    }

    fn build_request(
        &self,
        conversation: &Conversation,
        utterance: &str,
    ) -> ModelRequest {
        let mut req = if self.system_prompt.is_empty() {
            ModelRequest {
                messages: vec![],
                tools: vec![],
            }
        } else {
            ModelRequest::with_system(self.system_prompt.as_str())
        };
        req.messages
            .extend(conversation.history().map(|msg| msg.to_model_message()));
        req.messages.push(ModelMessage::User(utterance.to_owned()));
        req.tools = self.tools.definitions();
        req
    }

    async fn attempt(
        &self,
        req: &ModelRequest,
    ) -> Result<Resolved, backoff::Error<AttemptError>> {
        let decision = self.decide(req.clone()).await.map_err(|err| {
            backoff::Error::permanent(AttemptError::Model(err))
        })?;
        match decision {
            ModelDecision::Text(text) => Ok(Resolved::Text(text)),
            ModelDecision::ToolCall(call) => {
                self.tools.prepare(call).map(Resolved::Call).map_err(|err| {
                    warn!("the model sent an invalid tool call: {err}");
                    backoff::Error::transient(AttemptError::InvalidArguments(
                        err,
                    ))
                })
            }
        }
    }
}

enum Resolved {
    Text(String),
    Call(PreparedCall),
}

#[derive(Debug)]
enum AttemptError {
    Model(Box<dyn ModelProviderError>),
    InvalidArguments(tool::Error),
}

impl AttemptError {
    fn into_turn_error(self) -> TurnError {
        match self {
            AttemptError::Model(err) => TurnError::ModelUnavailable {
                kind: err.kind(),
                message: err.to_string(),
            },
            AttemptError::InvalidArguments(err) => {
                TurnError::ModelUnavailable {
                    kind: ErrorKind::Other,
                    message: format!("invalid tool call: {err}"),
                }
            }
        }
    }
}

/// Allows a single immediate retry.
#[derive(Clone, Copy, Debug, Default)]
struct RetryOnce {
    used: bool,
}

impl Backoff for RetryOnce {
    fn reset(&mut self) {
        self.used = false;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.used {
            return None;
        }
        self.used = true;
        Some(Duration::ZERO)
    }
}
