//! Local id synthesis
//!
//! Offline records get an epoch-millisecond id, matching what earlier
//! clients stored. Two records created in the same millisecond would
//! collide, so each id is bumped past the previous one handed out.

use std::sync::atomic::{AtomicI64, Ordering};

/// Strictly increasing, clock-derived id source
#[derive(Debug, Default)]
pub struct LocalIdGenerator {
    last: AtomicI64,
}

impl LocalIdGenerator {
    /// Create new generator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id: the current epoch millisecond, or one past the last id
    /// if the clock has not moved on
    pub fn next_id(&self) -> i64 {
        self.next_at(chrono::Utc::now().timestamp_millis())
    }

    /// Make sure future ids are greater than `id`
    pub fn observe(&self, id: i64) {
        self.last.fetch_max(id, Ordering::SeqCst);
    }

    fn next_at(&self, now_ms: i64) -> i64 {
        let step = |last: i64| now_ms.max(last.saturating_add(1));
        // the closure always returns Some, so this is never Err
        match self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(step(last)))
        {
            Ok(previous) | Err(previous) => step(previous),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_follow_the_clock() {
        let ids = LocalIdGenerator::new();
        assert_eq!(ids.next_at(1_000), 1_000);
        assert_eq!(ids.next_at(5_000), 5_000);
    }

    #[test]
    fn same_millisecond_does_not_collide() {
        let ids = LocalIdGenerator::new();
        assert_eq!(ids.next_at(1_000), 1_000);
        assert_eq!(ids.next_at(1_000), 1_001);
        assert_eq!(ids.next_at(999), 1_002);
    }

    #[test]
    fn observed_ids_are_skipped() {
        let ids = LocalIdGenerator::new();
        ids.observe(9_000);
        assert_eq!(ids.next_at(1_000), 9_001);
        ids.observe(10);
        assert_eq!(ids.next_at(1_000), 9_002);
    }

    #[test]
    fn real_clock_ids_increase() {
        let ids = LocalIdGenerator::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert!(b > a);
        assert!(a > 1_600_000_000_000);
    }
}
