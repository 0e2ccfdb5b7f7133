//! Publisher-confirm bookkeeping.
//!
//! A [`ConfirmMeta`] is attached to a publish on a channel in confirm mode.
//! The routing layer sets how many downstream acknowledgments it expects
//! (one per destination); delivery completions record them as they arrive.
//! Recording is an atomic increment so completions may race freely.

use std::sync::atomic::{AtomicU32, Ordering};

/// Acknowledgment contract of one publish.
#[derive(Debug)]
pub struct ConfirmMeta {
    pub conn_id: u64,
    pub chan_id: u16,
    pub delivery_tag: u64,
    expected_confirms: u32,
    actual_confirms: AtomicU32,
}

impl ConfirmMeta {
    /// Create a contract expecting `expected_confirms` acknowledgments.
    pub fn new(conn_id: u64, chan_id: u16, delivery_tag: u64, expected_confirms: u32) -> Self {
        Self {
            conn_id,
            chan_id,
            delivery_tag,
            expected_confirms,
            actual_confirms: AtomicU32::new(0),
        }
    }

    #[inline]
    pub fn expected_confirms(&self) -> u32 {
        self.expected_confirms
    }

    #[inline]
    pub fn actual_confirms(&self) -> u32 {
        self.actual_confirms.load(Ordering::Acquire)
    }

    /// Record one downstream acknowledgment.
    ///
    /// Never exceeds `expected_confirms`; extra notifications are ignored.
    /// Returns the count after recording.
    pub fn add_confirm(&self) -> u32 {
        let expected = self.expected_confirms;
        match self
            .actual_confirms
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |actual| {
                (actual < expected).then_some(actual + 1)
            }) {
            Ok(previous) => previous + 1,
            Err(current) => current,
        }
    }

    /// Check if every expected acknowledgment has arrived.
    ///
    /// A publish routed nowhere expects zero and is confirmable at once.
    #[inline]
    pub fn can_confirm(&self) -> bool {
        self.actual_confirms() == self.expected_confirms
    }
}

impl Clone for ConfirmMeta {
    fn clone(&self) -> Self {
        Self {
            conn_id: self.conn_id,
            chan_id: self.chan_id,
            delivery_tag: self.delivery_tag,
            expected_confirms: self.expected_confirms,
            actual_confirms: AtomicU32::new(self.actual_confirms()),
        }
    }
}

impl PartialEq for ConfirmMeta {
    fn eq(&self, other: &Self) -> bool {
        self.conn_id == other.conn_id
            && self.chan_id == other.chan_id
            && self.delivery_tag == other.delivery_tag
            && self.expected_confirms == other.expected_confirms
            && self.actual_confirms() == other.actual_confirms()
    }
}

impl Eq for ConfirmMeta {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn meta_with(expected: u32, actual: u32) -> ConfirmMeta {
        let meta = ConfirmMeta::new(1, 1, 1, expected);
        for _ in 0..actual {
            meta.add_confirm();
        }
        meta
    }

    #[test]
    fn test_can_confirm_when_all_arrived() {
        assert!(meta_with(3, 3).can_confirm());
    }

    #[test]
    fn test_cannot_confirm_when_missing() {
        assert!(!meta_with(3, 2).can_confirm());
    }

    #[test]
    fn test_unroutable_confirms_immediately() {
        let meta = meta_with(0, 0);
        assert!(meta.can_confirm());
        assert_eq!(meta.actual_confirms(), 0);
    }

    #[test]
    fn test_add_confirm_saturates() {
        let meta = ConfirmMeta::new(7, 2, 42, 2);
        assert_eq!(meta.add_confirm(), 1);
        assert_eq!(meta.add_confirm(), 2);
        assert_eq!(meta.add_confirm(), 2);
        assert_eq!(meta.actual_confirms(), 2);
        assert!(meta.can_confirm());

        let unroutable = ConfirmMeta::new(7, 2, 43, 0);
        assert_eq!(unroutable.add_confirm(), 0);
    }

    #[test]
    fn test_clone_snapshots_count() {
        let meta = meta_with(3, 1);
        let copy = meta.clone();
        meta.add_confirm();

        assert_eq!(copy.actual_confirms(), 1);
        assert_ne!(copy, meta);
        assert_eq!(copy.delivery_tag, meta.delivery_tag);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_confirms_are_not_lost() {
        let meta = Arc::new(ConfirmMeta::new(1, 1, 99, 500));
        let mut tasks = Vec::new();

        for _ in 0..5 {
            let meta = meta.clone();
            tasks.push(tokio::spawn(async move {
                for _ in 0..100 {
                    meta.add_confirm();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(meta.actual_confirms(), 500);
        assert!(meta.can_confirm());
    }
}
