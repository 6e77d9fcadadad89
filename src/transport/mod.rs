pub mod ws;

use crate::Result;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Message-oriented connection to the realtime endpoint. The transport
/// delivers whole text messages; framing below that is its own concern.
///
/// `recv` resolving to `Ok(None)` means the peer closed the stream.
pub trait Transport: Send {
    fn send(&mut self, text: String) -> BoxFuture<'_, Result<()>>;
    fn recv(&mut self) -> BoxFuture<'_, Result<Option<String>>>;
    fn close(&mut self) -> BoxFuture<'_, Result<()>>;
}
