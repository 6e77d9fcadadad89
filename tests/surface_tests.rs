use serde_json::json;
use simple_realtime::{Error, RealtimeSession, ToolSpec};

#[test]
fn builder_chain_compiles() {
    let _ = RealtimeSession::builder().debug(true).on_audio(|_pcm| {});
}

#[test]
fn send_requires_connection() {
    let session = RealtimeSession::builder().build();
    assert!(matches!(
        session.send("response.create", None),
        Err(Error::NotConnected)
    ));
    assert!(matches!(
        session.send("custom.event", Some(json!({"k": 1}))),
        Err(Error::NotConnected)
    ));
}

#[tokio::test]
async fn disconnect_is_idempotent() {
    let session = RealtimeSession::builder().build();
    assert!(!session.is_connected());
    session.disconnect().await.unwrap();
    session.disconnect().await.unwrap();
    assert!(!session.is_connected());
}

#[test]
fn duplicate_tool_registration_is_rejected() {
    let session = RealtimeSession::builder().build();
    session
        .add_tool(ToolSpec::new("clock"), |_| async move {
            Ok(json!({"time": "12:00"}))
        })
        .unwrap();

    let second = session.add_tool(ToolSpec::new("clock"), |_| async move {
        Ok(json!({"time": "never"}))
    });
    assert!(matches!(second, Err(Error::DuplicateTool(name)) if name == "clock"));
}

#[test]
fn fresh_session_has_empty_state() {
    let session = RealtimeSession::builder().debug(true).build();
    assert!(session.logs().is_empty());
    assert_eq!(session.transcript(), "");
    assert!(!session.is_connected());
}

#[test]
fn error_messages_name_the_condition() {
    assert_eq!(
        Error::NotConnected.to_string(),
        "session is not connected"
    );
    assert_eq!(
        Error::DuplicateTool("clock".to_string()).to_string(),
        "tool 'clock' already added"
    );
    assert_eq!(
        Error::UnknownTool("nope".to_string()).to_string(),
        "unknown tool: nope"
    );
}
