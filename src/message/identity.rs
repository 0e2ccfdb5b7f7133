//! Process-wide message identity generation.
//!
//! A single [`MessageIdGenerator`] is created at broker start and shared (by
//! reference or `Arc`) with every publish path. Identities come from one
//! lock-free atomic counter.
//!
//! # Seeding
//!
//! The counter starts at the wall-clock time in nanoseconds rather than 0,
//! so identities generated after a restart do not collide with those
//! already in durable storage. This holds only as long as the wall clock
//! never goes backwards across restarts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::Message;

/// Monotonic source of message identities.
#[derive(Debug)]
pub struct MessageIdGenerator {
    /// Last identity handed out.
    last: AtomicU64,
}

impl MessageIdGenerator {
    /// Create a generator seeded from the current wall-clock time.
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or(0);
        tracing::debug!(seed, "Seeding message identity generator");
        Self::with_seed(seed)
    }

    /// Create a generator whose first identity is `seed + 1`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            last: AtomicU64::new(seed),
        }
    }

    /// Produce the next identity.
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.last.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Assign an identity to `message` unless it already has one.
    ///
    /// Returns the message's identity either way.
    pub fn assign(&self, message: &mut Message) -> u64 {
        if message.id == 0 {
            message.id = self.next_id();
        }
        message.id
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
