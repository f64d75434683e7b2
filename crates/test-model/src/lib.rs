//! A local scripted model for testing purpose.

mod preset;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use bookbot_model::{
    ErrorKind, ModelFinishReason, ModelProvider, ModelProviderError,
    ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: &'static str,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: Result<Vec<ModelResponseEvent>, Option<Error>>,
    event_idx: usize,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        let events = match &mut this.events {
            Ok(events) => events,
            Err(err) => {
                // The error is reported once, then the stream is over.
                return Poll::Ready(match err.take() {
                    Some(err) => Err(err),
                    None => Ok(None),
                });
            }
        };

        let sleep = this
            .sleep
            .get_or_insert_with(|| Box::pin(sleep(this.delay)));
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        let event = events.get(this.event_idx).cloned();
        this.event_idx += 1;
        Poll::Ready(Ok(event))
    }
}

#[derive(Clone)]
enum ConversationStep {
    UserInput,
    AssistantResponse(Vec<PresetResponse>),
}

/// A local fake model for testing purpose.
///
/// Before sending requests, set up the conversation script, which is how
/// the model should respond to a request. The step is selected by the
/// number of non-system messages in the request, so a request carrying one
/// user message is answered by the second step. If the script has no
/// assistant step at that position, the response fails while streaming.
///
/// Every request is recorded, and the provider counts how many times each
/// step was requested, which drives [`PresetResponse::failures`] and
/// [`TestModelProvider::add_assistant_response_attempts`].
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    conversation_script: Vec<ConversationStep>,
    delay: Option<Duration>,
    attempts: Arc<Mutex<HashMap<usize, u64>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl TestModelProvider {
    #[inline]
    pub fn add_assistant_response_step(&mut self, preset: PresetResponse) {
        self.add_assistant_response_attempts(vec![preset]);
    }

    /// Adds an assistant step that answers the n-th attempt with the n-th
    /// preset. Attempts past the end reuse the last preset.
    #[inline]
    pub fn add_assistant_response_attempts(
        &mut self,
        presets: Vec<PresetResponse>,
    ) {
        self.conversation_script
            .push(ConversationStep::AssistantResponse(presets));
    }

    #[inline]
    pub fn add_user_input_step(&mut self) {
        self.conversation_script.push(ConversationStep::UserInput);
    }

    /// Adds a user step followed by an assistant step.
    #[inline]
    pub fn add_turn(&mut self, preset: PresetResponse) {
        self.add_user_input_step();
        self.add_assistant_response_step(preset);
    }

    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request sent so far, in order.
    pub fn recorded_requests(&self) -> Vec<ModelRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn next_attempt(&self, step_idx: usize) -> u64 {
        let mut attempts =
            self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
        let attempt = attempts.entry(step_idx).or_default();
        *attempt += 1;
        *attempt - 1
    }

    fn resolve(
        &self,
        req: &ModelRequest,
    ) -> Result<Result<Vec<ModelResponseEvent>, Option<Error>>, Error> {
        let step_idx = req.conversation_len();
        let presets = match self.conversation_script.get(step_idx) {
            None => {
                return Ok(Err(Some(Error {
                    message: "no enough steps",
                    kind: ErrorKind::RateLimitExceeded,
                })));
            }
            Some(ConversationStep::UserInput) => {
                return Ok(Err(Some(Error {
                    message: "not an assistant response step",
                    kind: ErrorKind::Moderated,
                })));
            }
            Some(ConversationStep::AssistantResponse(presets)) => presets,
        };

        let attempt = self.next_attempt(step_idx);
        let preset_idx =
            (attempt as usize).min(presets.len().saturating_sub(1));
        let Some(preset) = presets.get(preset_idx) else {
            return Ok(Ok(vec![ModelResponseEvent::Completed(
                ModelFinishReason::Stop,
            )]));
        };
        if preset.fails_on_attempt(attempt) {
            return Err(Error {
                message: "injected failure",
                kind: ErrorKind::Other,
            });
        }

        let mut events: Vec<_> = preset
            .events
            .iter()
            .map(|event| match event {
                PresetEvent::MessageDelta(msg) => {
                    ModelResponseEvent::MessageDelta(msg.clone())
                }
                PresetEvent::ToolCall(req) => {
                    ModelResponseEvent::ToolCall(req.clone())
                }
            })
            .collect();
        let has_tool_call = preset
            .events
            .iter()
            .any(|event| matches!(event, PresetEvent::ToolCall(_)));
        events.push(ModelResponseEvent::Completed(if has_tool_call {
            ModelFinishReason::ToolCalls
        } else {
            ModelFinishReason::Stop
        }));
        Ok(Ok(events))
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn model_name(&self) -> &str {
        "test-model"
    }

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(req.clone());

        let resp = self.resolve(req).map(|events| TestModelResponse {
            events,
            event_idx: 0,
            delay: self.delay.unwrap_or(Duration::from_millis(1)),
            sleep: None,
        });
        ready(resp)
    }
}
