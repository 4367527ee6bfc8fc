//! Telegram delivery of budget notifications.
//!
//! This crate is the concrete transport behind [`engine::ExternalNotifier`];
//! the engine decides when to notify, this crate only delivers.

use async_trait::async_trait;
use teloxide::{Bot, prelude::Requester, types::ChatId};

use engine::{ExternalNotifier, NotifyError};

pub struct Notifier {
    bot: Bot,
}

impl Notifier {
    pub fn new(token: &str) -> Self {
        Self {
            bot: Bot::new(token),
        }
    }
}

#[async_trait]
impl ExternalNotifier for Notifier {
    async fn send(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let chat: i64 = chat_id
            .parse()
            .map_err(|_| NotifyError::InvalidChat(chat_id.to_string()))?;

        self.bot
            .send_message(ChatId(chat), text)
            .await
            .map_err(|err| NotifyError::Delivery(err.to_string()))?;

        tracing::debug!(chat_id, "delivered telegram notification");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn non_numeric_chat_id_is_rejected_before_delivery() {
        let notifier = Notifier::new("000000000:TEST");

        let result = notifier.send("not-a-chat", "hello").await;
        assert!(matches!(result, Err(NotifyError::InvalidChat(_))));
    }
}
