use async_trait::async_trait;
use tracing::info;

use crate::error::LexicardResult;
use crate::traits::{Markup, Notifier};
use crate::types::ChatId;

/// Notifier that writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl TracingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, chat_id: ChatId, text: &str, markup: Option<&Markup>) -> LexicardResult<()> {
        let spoilers = markup.map_or(0, |m| m.spoilers.len());
        info!(chat_id, spoilers, "{}", text);
        Ok(())
    }

    fn name(&self) -> &str {
        "tracing"
    }
}
