//! reqwest-based version endpoint client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::domain::booking::{VersionQuery, VersionSnapshot};
use crate::ports::{TransportError, VersionFetcher};

/// Calls `GET {endpoint}?specialist_id=&work_location_id=&supervisor_mode=`.
#[derive(Debug, Clone)]
pub struct HttpVersionFetcher {
    client: Client,
    endpoint: String,
}

impl HttpVersionFetcher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl VersionFetcher for HttpVersionFetcher {
    async fn fetch(&self, query: &VersionQuery) -> Result<VersionSnapshot, TransportError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(query)
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

        response
            .json::<VersionSnapshot>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }
}
