//! Wire event shapes.
//!
//! Every message in either direction is a flat JSON object with a mandatory
//! `type` field. The server's event vocabulary is an open set: the dispatcher
//! acts on the few types below and treats everything else as log-only.

use serde_json::{Map, Value, json};

pub const FUNCTION_CALL_ARGUMENTS_DONE: &str = "response.function_call_arguments.done";
pub const AUDIO_TRANSCRIPT_DELTA: &str = "response.audio_transcript.delta";
pub const AUDIO_DELTA: &str = "response.audio.delta";

pub const SESSION_UPDATE: &str = "session.update";
pub const CONVERSATION_ITEM_CREATE: &str = "conversation.item.create";
pub const RESPONSE_CREATE: &str = "response.create";

/// Inbound events the dispatcher recognizes. Unrecognized types land in
/// `Other` so new server events pass through without breaking the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    FunctionCallArgumentsDone {
        name: String,
        call_id: String,
        arguments: String,
    },
    AudioTranscriptDelta {
        delta: String,
    },
    AudioDelta {
        delta: String,
    },
    Other,
}

impl Inbound {
    #[must_use]
    pub fn classify(event: &Value) -> Self {
        match event.get("type").and_then(Value::as_str) {
            Some(FUNCTION_CALL_ARGUMENTS_DONE) => Self::FunctionCallArgumentsDone {
                name: str_field(event, "name"),
                call_id: str_field(event, "call_id"),
                arguments: str_field(event, "arguments"),
            },
            Some(AUDIO_TRANSCRIPT_DELTA) => Self::AudioTranscriptDelta {
                delta: str_field(event, "delta"),
            },
            Some(AUDIO_DELTA) => Self::AudioDelta {
                delta: str_field(event, "delta"),
            },
            _ => Self::Other,
        }
    }
}

fn str_field(event: &Value, key: &str) -> String {
    event
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Merge `type` into an application-supplied body.
#[must_use]
pub fn with_type(event_type: &str, mut data: Map<String, Value>) -> Value {
    data.insert("type".to_string(), Value::String(event_type.to_string()));
    Value::Object(data)
}

/// `session.update` advertising the registered tools.
#[must_use]
pub fn session_update(tools: Vec<Value>) -> Value {
    json!({
        "type": SESSION_UPDATE,
        "session": {
            "tools": tools,
            "tool_choice": "auto",
        },
    })
}

/// `conversation.item.create` carrying a tool-call result back to the server.
#[must_use]
pub fn function_call_output(call_id: &str, output: &str) -> Value {
    json!({
        "type": CONVERSATION_ITEM_CREATE,
        "item": {
            "type": "function_call_output",
            "call_id": call_id,
            "output": output,
        },
    })
}

/// Bodyless `response.create` prompting the server to continue.
#[must_use]
pub fn response_create() -> Value {
    json!({ "type": RESPONSE_CREATE })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_function_call_done() {
        let event = json!({
            "type": "response.function_call_arguments.done",
            "name": "get_time",
            "call_id": "abc",
            "arguments": "{}",
        });
        let inbound = Inbound::classify(&event);
        assert_eq!(
            inbound,
            Inbound::FunctionCallArgumentsDone {
                name: "get_time".to_string(),
                call_id: "abc".to_string(),
                arguments: "{}".to_string(),
            }
        );
    }

    #[test]
    fn classify_unrecognized_type_is_other() {
        assert_eq!(
            Inbound::classify(&json!({"type": "session.created"})),
            Inbound::Other
        );
        assert_eq!(Inbound::classify(&json!({"delta": "x"})), Inbound::Other);
    }

    #[test]
    fn classify_audio_deltas() {
        let transcript = json!({"type": "response.audio_transcript.delta", "delta": "Hi"});
        assert_eq!(
            Inbound::classify(&transcript),
            Inbound::AudioTranscriptDelta {
                delta: "Hi".to_string()
            }
        );

        let audio = json!({"type": "response.audio.delta", "delta": "AQID"});
        assert_eq!(
            Inbound::classify(&audio),
            Inbound::AudioDelta {
                delta: "AQID".to_string()
            }
        );
    }

    #[test]
    fn with_type_merges_body() {
        let mut body = Map::new();
        body.insert("item".to_string(), json!({"role": "user"}));
        let event = with_type("conversation.item.create", body);
        assert_eq!(event["type"], "conversation.item.create");
        assert_eq!(event["item"]["role"], "user");
    }

    #[test]
    fn session_update_lists_tools_with_auto_choice() {
        let tools = vec![json!({"type": "function", "name": "t"})];
        let event = session_update(tools);
        assert_eq!(event["type"], "session.update");
        assert_eq!(event["session"]["tool_choice"], "auto");
        assert_eq!(event["session"]["tools"][0]["name"], "t");
    }

    #[test]
    fn function_call_output_shape() {
        let event = function_call_output("call_1", r#"{"time":"12:00"}"#);
        assert_eq!(event["type"], "conversation.item.create");
        assert_eq!(event["item"]["type"], "function_call_output");
        assert_eq!(event["item"]["call_id"], "call_1");
        assert_eq!(event["item"]["output"], r#"{"time":"12:00"}"#);
    }
}
