//! Call Budget
//!
//! Fixed-capacity counter shared by every component that reaches an external
//! lookup service. Acquisitions only ever increase the count; once the
//! capacity is spent every further attempt is refused.

use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Debug)]
pub struct CallBudget {
    limit: u32,
    used: AtomicU32,
}

impl CallBudget {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            used: AtomicU32::new(0),
        }
    }

    /// Take one call from the budget; `false` once exhausted
    pub fn try_acquire(&self) -> bool {
        self.used
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |used| {
                (used < self.limit).then_some(used + 1)
            })
            .is_ok()
    }

    pub fn used(&self) -> u32 {
        self.used.load(Ordering::Acquire)
    }

    pub fn remaining(&self) -> u32 {
        self.limit.saturating_sub(self.used())
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Restore full capacity. Nothing in a normal run calls this.
    pub fn reset(&self) {
        self.used.store(0, Ordering::Release);
    }
}
