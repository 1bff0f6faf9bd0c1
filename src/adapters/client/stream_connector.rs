//! reqwest-based push stream connector.

use std::time::Duration;

use async_trait::async_trait;
use futures::{future, stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;

use super::sse::SseDecoder;
use crate::ports::{FrameStream, StreamConnector, TransportError};

/// Opens `text/event-stream` connections over HTTP.
#[derive(Debug, Clone)]
pub struct HttpStreamConnector {
    client: Client,
}

impl HttpStreamConnector {
    /// Build a connector. Only connecting is bounded by `connect_timeout`;
    /// an established stream stays open indefinitely.
    pub fn new(connect_timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl StreamConnector for HttpStreamConnector {
    async fn connect(&self, url: &str) -> Result<FrameStream, TransportError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let frames = response
            .bytes_stream()
            .scan(SseDecoder::new(), |decoder, chunk| {
                let batch = match chunk {
                    Ok(bytes) => decoder.push(&bytes).into_iter().map(Ok).collect(),
                    Err(e) => vec![Err(TransportError::Stream(e.to_string()))],
                };
                future::ready(Some(batch))
            })
            .flat_map(stream::iter);

        Ok(frames.boxed())
    }
}
