//! Collaborator traits the scheduling engine depends on.
//!
//! Storage and transport live behind these seams so the engine can run
//! against SQLite in production and hand-written fakes in tests.

mod card_store;
mod clock;
mod learner_store;
mod notifier;
mod review_log;

pub use card_store::*;
pub use clock::*;
pub use learner_store::*;
pub use notifier::*;
pub use review_log::*;
