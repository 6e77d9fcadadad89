//! Interprets inbound server events.

use crate::events::{self, Inbound};
use crate::log::Direction;
use crate::outbound::OutboundSender;
use crate::session::{AudioSink, Shared};
use crate::tools::ToolHandler;
use crate::{Error, Result};
use base64::Engine as _;
use base64::engine::general_purpose;
use serde_json::{Value, json};
use std::sync::{Arc, PoisonError};

/// Routes each decoded inbound event: log it, then update transcript/audio
/// state or kick off a tool call. Runs inside the session task.
pub(crate) struct Dispatcher {
    shared: Arc<Shared>,
    audio_sink: Option<AudioSink>,
    outbound: OutboundSender,
}

impl Dispatcher {
    pub(crate) const fn new(
        shared: Arc<Shared>,
        audio_sink: Option<AudioSink>,
        outbound: OutboundSender,
    ) -> Self {
        Self {
            shared,
            audio_sink,
            outbound,
        }
    }

    /// Parse one raw text message. Malformed JSON is logged and dropped; it is
    /// never fatal to the receive loop.
    pub(crate) fn handle_raw(&self, text: &str) {
        match serde_json::from_str::<Value>(text) {
            Ok(event) => self.handle(event),
            Err(err) => tracing::warn!("dropping malformed inbound message: {err}"),
        }
    }

    pub(crate) fn handle(&self, event: Value) {
        self.shared.log.record(Direction::Server, &event);

        match Inbound::classify(&event) {
            Inbound::FunctionCallArgumentsDone {
                name,
                call_id,
                arguments,
            } => self.spawn_tool_call(name, call_id, arguments),
            Inbound::AudioTranscriptDelta { delta } => self.shared.append_transcript(&delta),
            Inbound::AudioDelta { delta } => self.forward_audio(&delta),
            Inbound::Other => {}
        }
    }

    fn forward_audio(&self, delta: &str) {
        let Some(sink) = &self.audio_sink else {
            return;
        };
        match general_purpose::STANDARD.decode(delta.as_bytes()) {
            Ok(pcm) => sink(pcm),
            Err(err) => tracing::warn!("dropping undecodable audio delta: {err}"),
        }
    }

    /// Tool execution runs on its own task so a slow handler never stalls the
    /// receive loop; its response events re-enter the ordered outbound path.
    fn spawn_tool_call(&self, name: String, call_id: String, arguments: String) {
        let handler = {
            let tools = self
                .shared
                .tools
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match tools.lookup(&name) {
                Ok(handler) => handler,
                Err(err) => {
                    // Unknown tool: the call stays unanswered on the wire.
                    tracing::warn!(%call_id, "{err}");
                    return;
                }
            }
        };

        let outbound = self.outbound.clone();
        tokio::spawn(run_tool_call(handler, call_id, arguments, outbound));
    }
}

async fn run_tool_call(
    handler: ToolHandler,
    call_id: String,
    arguments: String,
    outbound: OutboundSender,
) {
    let outcome = match parse_arguments(&arguments) {
        Ok(args) => handler(args).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(output) => {
            let output = output.to_string();
            if outbound
                .enqueue(&events::function_call_output(&call_id, &output))
                .is_err()
            {
                return;
            }
            let _ = outbound.enqueue(&events::response_create());
        }
        Err(err) => {
            tracing::warn!(%call_id, "tool call failed: {err}");
            let output = json!({ "error": err.to_string() }).to_string();
            // No follow-up response.create on the error path.
            let _ = outbound.enqueue(&events::function_call_output(&call_id, &output));
        }
    }
}

fn parse_arguments(arguments: &str) -> Result<Value> {
    if arguments.trim().is_empty() {
        return Ok(json!({}));
    }
    serde_json::from_str(arguments)
        .map_err(|err| Error::ToolExecution(format!("argument parse: {err}")))
}

#[cfg(test)]
mod tests {
    use super::parse_arguments;
    use serde_json::json;

    #[test]
    fn empty_arguments_default_to_empty_object() {
        assert_eq!(parse_arguments("").unwrap(), json!({}));
        assert_eq!(parse_arguments("  ").unwrap(), json!({}));
    }

    #[test]
    fn argument_blob_parses_as_json() {
        assert_eq!(
            parse_arguments(r#"{"city":"Oslo"}"#).unwrap(),
            json!({"city": "Oslo"})
        );
        assert!(parse_arguments("{not json").is_err());
    }
}
