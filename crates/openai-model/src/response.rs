use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use bookbot_model::{
    ErrorKind, ModelFinishReason, ModelResponse, ModelResponseEvent,
    ToolCallRequest,
};
use pin_project_lite::pin_project;
use serde_json::{Map, Value};

use crate::Error;
use crate::io::{ChunksError, Sse, SseError};
use crate::proto::{ChatCompletionChunk, ToolCallDelta};

/// A tool call whose fragments are still arriving.
#[derive(Debug, Default)]
struct PartialToolCall {
    index: Option<u32>,
    id: String,
    name: String,
    arguments: String,
}

impl PartialToolCall {
    fn patch(&mut self, delta: ToolCallDelta) {
        if let Some(id) = delta.id {
            self.id.push_str(&id);
        }
        if let Some(function) = delta.function {
            if let Some(name) = function.name {
                self.name.push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                self.arguments.push_str(&arguments);
            }
        }
    }

    fn into_request(self) -> ToolCallRequest {
        // Arguments that are not JSON are handed over verbatim, so the
        // tool rejects them as invalid input instead of seeing `null`.
        let arguments = if self.arguments.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_str(&self.arguments)
                .unwrap_or(Value::String(self.arguments))
        };
        ToolCallRequest {
            id: self.id,
            name: self.name,
            arguments,
        }
    }
}

struct StreamState {
    sse: Sse,
    id: Option<String>,
    tool_calls: Vec<PartialToolCall>,
    pending: VecDeque<ModelResponseEvent>,
    finished: bool,
}

impl StreamState {
    fn apply(&mut self, mut chunk: ChatCompletionChunk) -> Result<(), Error> {
        if self.id.get_or_insert_with(|| chunk.id.clone()) != &chunk.id {
            return Err(Error::new("chunk id mismatch", ErrorKind::Other));
        }
        // Usage-only chunks carry no choices.
        if chunk.choices.is_empty() {
            return Ok(());
        }
        let choice = chunk.choices.swap_remove(0);

        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty())
        {
            self.pending
                .push_back(ModelResponseEvent::MessageDelta(content));
        }
        for delta in choice.delta.tool_calls.unwrap_or_default() {
            match self.tool_calls.iter_mut().find(|t| t.index == delta.index)
            {
                Some(partial) => partial.patch(delta),
                None => {
                    let mut partial = PartialToolCall {
                        index: delta.index,
                        ..Default::default()
                    };
                    partial.patch(delta);
                    self.tool_calls.push(partial);
                }
            }
        }
        if let Some(reason) = choice.finish_reason {
            let reason = match reason.as_str() {
                "tool_calls" => ModelFinishReason::ToolCalls,
                "content_filter" => {
                    return Err(Error::new(
                        "the response was blocked by the content filter",
                        ErrorKind::Moderated,
                    ));
                }
                _ => ModelFinishReason::Stop,
            };
            self.finish(Some(reason));
        }
        Ok(())
    }

    /// Flushes the assembled tool calls, then the completion event.
    fn finish(&mut self, reason: Option<ModelFinishReason>) {
        if self.finished {
            return;
        }
        self.finished = true;
        let has_tool_calls = !self.tool_calls.is_empty();
        for partial in self.tool_calls.drain(..) {
            let request = partial.into_request();
            self.pending.push_back(ModelResponseEvent::ToolCall(request));
        }
        let reason = reason.unwrap_or(if has_tool_calls {
            ModelFinishReason::ToolCalls
        } else {
            ModelFinishReason::Stop
        });
        self.pending.push_back(ModelResponseEvent::Completed(reason));
    }
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, StreamState), Error>;

pin_project! {
    /// A streamed chat completion.
    pub struct OpenAIResponse {
        next_event_fut: Option<PinnedFuture<NextEvent>>,
    }
}

impl OpenAIResponse {
    pub(crate) fn from_sse(sse: Sse) -> Self {
        let state = StreamState {
            sse,
            id: None,
            tool_calls: vec![],
            pending: VecDeque::new(),
            finished: false,
        };
        Self {
            next_event_fut: Some(Box::pin(next_event(state))),
        }
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.project();
        let Some(next_event_fut) = this.next_event_fut else {
            return Poll::Ready(Ok(None));
        };
        match ready!(next_event_fut.as_mut().poll(cx)) {
            Ok((Some(event), state)) => {
                *this.next_event_fut = Some(Box::pin(next_event(state)));
                Poll::Ready(Ok(Some(event)))
            }
            Ok((None, _)) => {
                *this.next_event_fut = None;
                Poll::Ready(Ok(None))
            }
            Err(err) => {
                *this.next_event_fut = None;
                Poll::Ready(Err(err))
            }
        }
    }
}

async fn next_event(mut state: StreamState) -> NextEvent {
    loop {
        if let Some(event) = state.pending.pop_front() {
            return Ok((Some(event), state));
        }
        if state.finished {
            return Ok((None, state));
        }

        let data = match state.sse.next_event().await {
            Ok(Some(data)) => data,
            // Neither a finish reason nor `[DONE]`: the reply was cut off.
            Ok(None) => {
                return Err(Error::new(
                    "the completion stream ended early",
                    ErrorKind::Other,
                ));
            }
            Err(SseError::Chunks(ChunksError::TimedOut)) => {
                return Err(Error::new(
                    "timed out while streaming the completion",
                    ErrorKind::Timeout,
                ));
            }
            Err(err) => {
                return Err(Error::new(format!("{err:?}"), ErrorKind::Other));
            }
        };
        trace!("got sse event: {data}");
        if data == "[DONE]" {
            state.finish(None);
            continue;
        }

        let chunk = serde_json::from_str::<ChatCompletionChunk>(&data)
            .map_err(|err| Error::new(format!("{err}"), ErrorKind::Other))?;
        state.apply(chunk)?;
    }
}
