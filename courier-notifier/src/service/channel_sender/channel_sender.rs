use super::Error;
use axum::async_trait;

///
/// Third-party backed delivery capability of one channel.
///
/// Latency and failure modes of the provider are opaque. Timeouts, auth
/// errors and rate limits all surface as a generic failure and feed the
/// dispatcher's retry budget.
///
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelSender: Send + Sync {
    async fn send(&self, content: &str) -> Result<(), Error>;
}
