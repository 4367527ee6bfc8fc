//! External notification bridge.
//!
//! The engine only knows this trait; the concrete transport (Telegram) lives
//! in its own crate. Delivery is best-effort: the caller creates the in-app
//! notification first and never rolls it back on a failed push.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid chat identity: {0}")]
    InvalidChat(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[async_trait::async_trait]
pub trait ExternalNotifier: Send + Sync {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError>;
}

/// Sink used when no external channel is configured.
pub struct NullNotifier;

#[async_trait::async_trait]
impl ExternalNotifier for NullNotifier {
    async fn send(&self, _chat_id: &str, _text: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}
