use crate::session::{AudioSink, RealtimeSession};
use std::sync::Arc;

/// Configures a [`RealtimeSession`] before any connection exists.
///
/// The session owns its lifecycle explicitly: the embedding application
/// builds it once, then drives `connect`/`disconnect`.
#[must_use]
pub struct SessionBuilder {
    debug: bool,
    audio_sink: Option<AudioSink>,
    runtime: Option<tokio::runtime::Handle>,
}

impl SessionBuilder {
    pub(crate) const fn new() -> Self {
        Self {
            debug: false,
            audio_sink: None,
            runtime: None,
        }
    }

    /// Retain every inbound/outbound event in the session log.
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Receive decoded PCM audio from `response.audio.delta` events.
    pub fn on_audio<F>(mut self, sink: F) -> Self
    where
        F: Fn(Vec<u8>) + Send + Sync + 'static,
    {
        self.audio_sink = Some(Arc::new(sink));
        self
    }

    /// Run the background session task on a specific runtime instead of the
    /// ambient one.
    pub fn runtime(mut self, handle: tokio::runtime::Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn build(self) -> RealtimeSession {
        RealtimeSession::from_parts(self.debug, self.audio_sink, self.runtime)
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
