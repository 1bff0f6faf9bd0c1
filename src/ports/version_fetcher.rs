//! VersionFetcher port - Client side of the version endpoint.

use async_trait::async_trait;

use super::TransportError;
use crate::domain::booking::{VersionQuery, VersionSnapshot};

#[async_trait]
pub trait VersionFetcher: Send + Sync {
    async fn fetch(&self, query: &VersionQuery) -> Result<VersionSnapshot, TransportError>;
}
