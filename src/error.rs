use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("session is already connected")]
    AlreadyConnected,

    #[error("session is not connected")]
    NotConnected,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("tool '{0}' already added")]
    DuplicateTool(String),

    #[error("invalid tool handler: {0}")]
    InvalidHandler(String),

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("tool execution failed: {0}")]
    ToolExecution(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to parse or serialize JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("header error: {0}")]
    Header(#[from] tokio_tungstenite::tungstenite::http::header::InvalidHeaderValue),

    #[error("API key not available: {0}")]
    MissingApiKey(#[from] std::env::VarError),

    #[error("the connection was closed unexpectedly")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
