//! StreamConnector port - Client side of the push stream.

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use thiserror::Error;

/// Errors from the client transports (stream and version polling).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Failed to connect: {0}")]
    Connect(String),

    #[error("Stream interrupted: {0}")]
    Stream(String),

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether retrying later may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Connect(_) | TransportError::Stream(_) => true,
            TransportError::Http { status, .. } => *status >= 500 || *status == 429,
            TransportError::Decode(_) => false,
        }
    }
}

/// A server-sent event as seen by the client library.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// Handshake; payload echoes scope and id.
    Connected(Value),
    /// Keep-alive.
    Heartbeat,
    /// Raw envelope JSON, parsed by the client.
    Message(String),
}

/// Frames until the server closes the stream or an error ends it.
pub type FrameStream = BoxStream<'static, Result<StreamFrame, TransportError>>;

/// Port for opening the push stream.
#[async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<FrameStream, TransportError>;
}
