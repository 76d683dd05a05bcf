//! Level to review-interval ladder.

/// Days until the next review, indexed by `level - 1`.
///
/// Ten steps adding up to roughly three months.
pub const REVIEW_INTERVAL_DAYS: [i64; 10] = [1, 1, 2, 4, 7, 14, 21, 21, 19, 0];

/// Days to wait before showing a card at `level` again.
///
/// Levels outside `1..=10` get the *first* interval, not the last. A learned
/// card (level 11) is never scheduled, so this only matters for callers that
/// bypass [`super::ReviewScheduler`].
pub fn interval_days(level: i64) -> i64 {
    if level < 1 || level > REVIEW_INTERVAL_DAYS.len() as i64 {
        return REVIEW_INTERVAL_DAYS[0];
    }
    REVIEW_INTERVAL_DAYS[(level - 1) as usize]
}
