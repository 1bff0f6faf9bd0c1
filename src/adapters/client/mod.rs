//! HTTP transports used by the client delivery library.

mod sse;
mod stream_connector;
mod version_fetcher;

pub use sse::SseDecoder;
pub use stream_connector::HttpStreamConnector;
pub use version_fetcher::HttpVersionFetcher;
