//! The realtime session: connection lifecycle, the background receive loop,
//! and the public surface the embedding application drives.

use crate::dispatch::Dispatcher;
use crate::events;
use crate::log::{EventLog, LogEntry};
use crate::outbound::{Command, OutboundSender};
use crate::tools::{ToolRegistry, ToolSpec};
use crate::transport::{self, Transport};
use crate::{Error, Result};
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Environment variable holding the bearer token.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Receives decoded PCM audio from `response.audio.delta` events.
pub type AudioSink = Arc<dyn Fn(Vec<u8>) + Send + Sync>;

/// How long one receive poll may block before the loop checks for
/// cancellation and pending outbound commands.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// State shared between the session handle, the session task, and spawned
/// tool-call tasks.
pub(crate) struct Shared {
    pub(crate) log: EventLog,
    pub(crate) transcript: Mutex<String>,
    pub(crate) tools: Mutex<ToolRegistry>,
    pub(crate) conn: Mutex<Option<Connection>>,
}

/// Handles for one live connection. Exclusively owned by the session; at most
/// one exists at a time.
pub(crate) struct Connection {
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl Shared {
    /// Serialize, schedule on the single-writer channel, then log as
    /// client-originated. Wire order equals submission order.
    pub(crate) fn enqueue(
        &self,
        commands: &mpsc::UnboundedSender<Command>,
        event: &Value,
    ) -> Result<()> {
        let frame = serde_json::to_string(event)?;
        commands
            .send(Command::Send(frame))
            .map_err(|_| Error::NotConnected)?;
        self.log.record(crate::log::Direction::Client, event);
        Ok(())
    }

    pub(crate) fn append_transcript(&self, delta: &str) {
        self.transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(delta);
    }

    /// Drop the connection handles so the session reads as Disconnected
    /// instead of half-open. Called from the session task on fatal faults.
    pub(crate) fn clear_conn(&self) {
        drop(
            self.conn
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
    }
}

/// One logical session against the realtime endpoint.
///
/// Created disconnected; `connect` opens the WebSocket and spawns exactly one
/// background task that owns the transport, drains inbound events, and writes
/// all outbound frames in submission order. Drive it from any number of
/// callers; the handles are cheap to share behind the embedding application.
#[must_use]
pub struct RealtimeSession {
    shared: Arc<Shared>,
    audio_sink: Option<AudioSink>,
    runtime: Option<tokio::runtime::Handle>,
}

impl RealtimeSession {
    #[must_use = "builder does nothing until build() is called"]
    pub fn builder() -> crate::builder::SessionBuilder {
        crate::builder::SessionBuilder::new()
    }

    pub(crate) fn from_parts(
        debug: bool,
        audio_sink: Option<AudioSink>,
        runtime: Option<tokio::runtime::Handle>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                log: EventLog::new(debug),
                transcript: Mutex::new(String::new()),
                tools: Mutex::new(ToolRegistry::new()),
                conn: Mutex::new(None),
            }),
            audio_sink,
            runtime,
        }
    }

    /// Open an authenticated connection and start the receive loop. If any
    /// tools are registered, one `session.update` listing them is sent before
    /// returning. Never retries.
    ///
    /// # Errors
    /// Returns `Error::AlreadyConnected` if a connection is live,
    /// `Error::MissingApiKey` if `OPENAI_API_KEY` is unset, or a transport
    /// error if the handshake fails.
    pub async fn connect(&self, model: &str) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }
        let api_key = std::env::var(API_KEY_ENV)?;
        let transport = transport::ws::connect(&api_key, model).await?;
        self.attach(Box::new(transport))
    }

    /// Tear down the connection and await the session task. Idempotent: a
    /// no-op on a disconnected session.
    ///
    /// # Errors
    /// Currently infallible; the `Result` reserves room for teardown faults.
    pub async fn disconnect(&self) -> Result<()> {
        let Some(conn) = self
            .shared
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return Ok(());
        };

        let _ = conn.commands.send(Command::Shutdown);
        match conn.task.await {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => {}
            Err(err) => tracing::warn!("session task ended abnormally: {err}"),
        }
        Ok(())
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.shared
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Merge `type` into `data` and schedule the event for transmission,
    /// returning as soon as it is queued.
    ///
    /// # Errors
    /// Returns `Error::NotConnected` when disconnected, or
    /// `Error::InvalidPayload` when `data` is not a JSON object.
    pub fn send(&self, event_type: &str, data: Option<Value>) -> Result<()> {
        let body = match data {
            None => Map::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(Error::InvalidPayload(format!(
                    "data must be a JSON object, got {}",
                    value_kind(&other)
                )));
            }
        };

        let guard = self
            .shared
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(conn) = guard.as_ref() else {
            return Err(Error::NotConnected);
        };
        let event = events::with_type(event_type, body);
        self.shared.enqueue(&conn.commands, &event)
    }

    /// Register a tool under an explicit schema. When the session is already
    /// connected, the server's tool list is refreshed immediately with a
    /// `session.update`.
    ///
    /// # Errors
    /// Returns `Error::DuplicateTool` or `Error::InvalidHandler` on a bad
    /// registration; those never alter previously registered tools.
    pub fn add_tool<F, Fut>(&self, spec: ToolSpec, handler: F) -> Result<()>
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value>> + Send + 'static,
    {
        {
            let mut tools = self
                .shared
                .tools
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            tools.register(spec, handler)?;
        }
        self.announce_tools()
    }

    /// Register a tool whose schema is derived from the argument type.
    ///
    /// # Errors
    /// Same conditions as [`RealtimeSession::add_tool`].
    pub fn add_tool_fn<TArgs, TResp, F, Fut>(
        &self,
        name: &str,
        description: &str,
        handler: F,
    ) -> Result<()>
    where
        TArgs: DeserializeOwned + JsonSchema + Send + 'static,
        TResp: Serialize + Send + 'static,
        F: Fn(TArgs) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<TResp>> + Send + 'static,
    {
        {
            let mut tools = self
                .shared
                .tools
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            tools.register_typed(name, description, handler)?;
        }
        self.announce_tools()
    }

    /// Accumulated transcript text reconstructed from audio-transcript deltas.
    #[must_use]
    pub fn transcript(&self) -> String {
        self.shared
            .transcript
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Snapshot of the event log in arrival/submission order.
    #[must_use]
    pub fn logs(&self) -> Vec<LogEntry> {
        self.shared.log.snapshot()
    }

    /// Install a transport and spawn the session task.
    fn attach(&self, transport: Box<dyn Transport>) -> Result<()> {
        let (commands, command_rx) = mpsc::unbounded_channel();
        {
            let mut guard = self
                .shared
                .conn
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if guard.is_some() {
                return Err(Error::AlreadyConnected);
            }

            let outbound = OutboundSender::new(Arc::clone(&self.shared), commands.clone());
            let dispatcher =
                Dispatcher::new(Arc::clone(&self.shared), self.audio_sink.clone(), outbound);
            let session_loop =
                run_session(transport, command_rx, dispatcher, Arc::clone(&self.shared));
            let task = match &self.runtime {
                Some(handle) => handle.spawn(session_loop),
                None => tokio::spawn(session_loop),
            };
            *guard = Some(Connection {
                commands: commands.clone(),
                task,
            });
        }

        let tools = self
            .shared
            .tools
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot();
        if !tools.is_empty() {
            self.shared
                .enqueue(&commands, &events::session_update(tools))?;
        }
        Ok(())
    }

    fn announce_tools(&self) -> Result<()> {
        let guard = self
            .shared
            .conn
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(conn) = guard.as_ref() else {
            // Not connected yet; the tool list goes out at connect time.
            return Ok(());
        };
        let tools = self
            .shared
            .tools
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .snapshot();
        self.shared
            .enqueue(&conn.commands, &events::session_update(tools))
    }
}

const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// The session task: sole owner of the transport for its lifetime. Drains
/// outbound commands and polls for inbound messages, never blocking longer
/// than one poll interval so shutdown is observed promptly. Any transport
/// fault tears the session down to a clean Disconnected state.
async fn run_session(
    mut transport: Box<dyn Transport>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    dispatcher: Dispatcher,
    shared: Arc<Shared>,
) {
    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(Command::Send(frame)) => {
                    tracing::trace!(bytes = frame.len(), "sending event");
                    if let Err(err) = transport.send(frame).await {
                        tracing::warn!("send failed, tearing down session: {err}");
                        shared.clear_conn();
                        break;
                    }
                }
                Some(Command::Shutdown) | None => {
                    if let Err(err) = transport.close().await {
                        tracing::debug!("transport close: {err}");
                    }
                    break;
                }
            },
            inbound = timeout(POLL_INTERVAL, transport.recv()) => match inbound {
                Err(_) => {} // poll timeout; loop again
                Ok(Ok(Some(text))) => dispatcher.handle_raw(&text),
                Ok(Ok(None)) => {
                    tracing::info!("connection closed, tearing down session");
                    shared.clear_conn();
                    break;
                }
                Ok(Err(err)) => {
                    tracing::warn!("receive failed, tearing down session: {err}");
                    shared.clear_conn();
                    break;
                }
            },
        }
    }
}
