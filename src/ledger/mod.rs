//! Bounded history ledgers for test methods.
//!
//! Both ledgers share one shape: build an immutable record stamped by the
//! clock, cons it onto the method's history, truncate to the cap, and
//! mirror it into the method's `last_*` field.

pub mod execution;
pub mod remediation;

pub use execution::{ExecutionDetails, ExecutionLedger, ExecutionStats, EXECUTION_HISTORY_CAP};
pub use remediation::{
    requires_remediation, RemediationDetails, RemediationLedger, RemediationStats,
    REMEDIATION_HISTORY_CAP,
};

/// Prepends `record` to `history` and keeps at most `cap` entries.
pub(crate) fn cons_capped<T>(record: T, history: Vec<T>, cap: usize) -> Vec<T> {
    std::iter::once(record).chain(history).take(cap).collect()
}

/// Mean of the given durations, truncated; zero for an empty slice.
pub(crate) fn mean_duration(durations: impl ExactSizeIterator<Item = u64>) -> u64 {
    let count = durations.len() as u64;
    if count == 0 {
        return 0;
    }
    let total: u128 = durations.map(u128::from).sum();
    u64::try_from(total / u128::from(count)).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn cons_capped_keeps_the_newest_cap_entries(n in 0usize..200, cap in 1usize..60) {
            let mut history = Vec::new();
            for i in 0..n {
                history = cons_capped(i, history, cap);
            }
            let expected: Vec<usize> = (0..n).rev().take(cap).collect();
            prop_assert_eq!(history.len(), n.min(cap));
            prop_assert_eq!(history, expected);
        }
    }

    #[test]
    fn mean_duration_of_nothing_is_zero() {
        assert_eq!(mean_duration(Vec::<u64>::new().into_iter()), 0);
        assert_eq!(mean_duration(vec![10, 20, 31].into_iter()), 20);
    }
}
