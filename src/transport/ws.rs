use crate::error::Result;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

use super::{BoxFuture, Transport};

const WS_BASE_URL: &str = "wss://api.openai.com/v1/realtime";
const PROTOCOL_HEADER: &str = "OpenAI-Beta";
const PROTOCOL_VERSION: &str = "realtime=v1";

pub const DEFAULT_MODEL: &str = "gpt-4o-realtime-preview-2024-10-01";

/// WebSocket transport to the Realtime API.
#[derive(Debug)]
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

/// Establish an authenticated WebSocket connection.
///
/// # Errors
/// Returns an error if the URL or headers are invalid or the handshake fails.
pub async fn connect(api_key: &str, model: &str) -> Result<WsTransport> {
    let mut url = Url::parse(WS_BASE_URL)?;
    url.query_pairs_mut().append_pair("model", model);

    let mut req = IntoClientRequest::into_client_request(url.as_str())?;
    let headers = req.headers_mut();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {api_key}"))?,
    );
    headers.insert(PROTOCOL_HEADER, HeaderValue::from_static(PROTOCOL_VERSION));

    let (stream, _) = connect_async(req).await?;
    tracing::info!(model, "connected to realtime endpoint");
    Ok(WsTransport { stream })
}

impl Transport for WsTransport {
    fn send(&mut self, text: String) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            self.stream.send(Message::Text(text.into())).await?;
            Ok(())
        })
    }

    fn recv(&mut self) -> BoxFuture<'_, Result<Option<String>>> {
        Box::pin(async move {
            while let Some(msg) = self.stream.next().await {
                match msg? {
                    Message::Text(text) => return Ok(Some(text.to_string())),
                    Message::Close(_) => {
                        tracing::info!("WebSocket connection closed by server");
                        return Ok(None);
                    }
                    Message::Ping(payload) => {
                        tracing::debug!("received Ping, sending Pong");
                        self.stream.send(Message::Pong(payload)).await?;
                    }
                    _ => (),
                }
            }
            Ok(None)
        })
    }

    fn close(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            use tokio_tungstenite::tungstenite::Error as WsError;
            match self.stream.close(None).await {
                Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Ok(()),
                Err(err) => Err(err.into()),
            }
        })
    }
}
