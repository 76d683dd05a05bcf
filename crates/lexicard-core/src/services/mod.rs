//! Application services used by chat handlers and the reminder engine.

mod cards;
mod learners;
mod stats;

pub use cards::{AppliedReview, CardService, ReviewOutcome};
pub use learners::LearnerService;
pub use stats::StatsService;
