#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::multiple_crate_versions)]

pub mod builder;
pub mod error;
pub mod events;
pub mod log;
pub mod session;
pub mod tools;
pub mod transport;

mod dispatch;
mod outbound;

pub use builder::SessionBuilder;
pub use error::{Error, Result};
pub use log::{Direction, LogEntry};
pub use session::{API_KEY_ENV, AudioSink, RealtimeSession};
pub use tools::{BoxFuture as ToolFuture, ToolHandler, ToolRegistry, ToolSpec};
pub use transport::Transport;
pub use transport::ws::DEFAULT_MODEL;
