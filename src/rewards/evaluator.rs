/// Where a user stands inside the current reward cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardProgress {
    pub current_in_cycle: i64,
    pub required_visits: i64,
    pub percentage: f64,
    /// True exactly when `total_visits` completes a cycle (5th, 10th, …).
    /// Recomputes the same way on every read, so it only means "just
    /// happened" right after a visit is recorded.
    pub just_unlocked: bool,
}

pub fn evaluate(total_visits: i64, required_visits: i64) -> RewardProgress {
    let required = required_visits.max(1);
    let total = total_visits.max(0);
    let current = total % required;
    let percentage = (100.0 * current as f64 / required as f64).clamp(0.0, 100.0);

    RewardProgress {
        current_in_cycle: current,
        required_visits: required,
        percentage,
        just_unlocked: total > 0 && current == 0,
    }
}

/// Number of completed cycles, i.e. the cycle a just-unlocked reward belongs to.
pub fn completed_cycles(total_visits: i64, required_visits: i64) -> i64 {
    total_visits.max(0) / required_visits.max(1)
}
