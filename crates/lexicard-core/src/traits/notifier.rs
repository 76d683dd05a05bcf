//! Outbound message transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LexicardResult;
use crate::types::ChatId;

/// Presentation hints passed along with a message.
///
/// The core never formats for a specific transport; it only names which
/// substrings of the text should be rendered hidden until tapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markup {
    pub spoilers: Vec<String>,
}

impl Markup {
    /// Markup hiding the given substrings.
    pub fn spoilers<I, S>(spoilers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            spoilers: spoilers.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether there is nothing to hide.
    pub fn is_empty(&self) -> bool {
        self.spoilers.is_empty()
    }
}

/// Delivers text to a learner's chat.
///
/// Timeouts and retries are the implementation's concern.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `text` to `chat_id`.
    async fn send(&self, chat_id: ChatId, text: &str, markup: Option<&Markup>) -> LexicardResult<()>;

    /// Transport name, for logs.
    fn name(&self) -> &str;
}
