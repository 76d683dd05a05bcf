//! Spaced-repetition scheduling.
//!
//! - [`interval_days`]: fixed level-to-interval ladder
//! - [`ReviewScheduler`]: applies one review outcome to a card
//! - [`DueCardSelector`]: picks the next card to show a learner

mod intervals;
mod review;
mod rng;
mod selector;

pub use intervals::{interval_days, REVIEW_INTERVAL_DAYS};
pub use review::{ReviewScheduler, ReviewTransition};
pub use rng::SharedRng;
pub use selector::DueCardSelector;
