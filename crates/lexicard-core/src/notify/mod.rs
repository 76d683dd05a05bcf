//! Notifier implementations and message rendering.

mod log;
mod render;
mod webhook;

pub use log::TracingNotifier;
pub use render::{render_daily_summary, render_practice_card, render_reminder, Message};
pub use webhook::{sign_payload, verify_signature, WebhookNotifier, SIGNATURE_HEADER};
