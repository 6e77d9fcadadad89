//! Ordered, fire-and-forget path for client-originated events.
//!
//! Every outbound event, whether application-issued or produced by the tool
//! round trip, is serialized onto the session task's command channel. The
//! session task is the only writer on the connection, so wire order always
//! equals submission order.

use crate::Result;
use crate::session::Shared;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Instructions for the session task.
pub(crate) enum Command {
    /// Transmit one serialized event.
    Send(String),
    /// Close the transport and end the loop.
    Shutdown,
}

/// Handle for enqueueing outbound events from outside the session task.
#[derive(Clone)]
pub(crate) struct OutboundSender {
    shared: Arc<Shared>,
    commands: mpsc::UnboundedSender<Command>,
}

impl OutboundSender {
    pub(crate) const fn new(shared: Arc<Shared>, commands: mpsc::UnboundedSender<Command>) -> Self {
        Self { shared, commands }
    }

    /// Log the event as client-originated and schedule its transmission.
    ///
    /// Returns `Error::NotConnected` if the session task has already exited.
    pub(crate) fn enqueue(&self, event: &Value) -> Result<()> {
        self.shared.enqueue(&self.commands, event)
    }
}
