//! Core types for lexicard.

mod card;
mod learner;
mod review;
mod stats;

pub use card::*;
pub use learner::*;
pub use review::*;
pub use stats::*;
