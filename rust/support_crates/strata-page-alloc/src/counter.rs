use std::sync::atomic::{AtomicU64, Ordering};

/// Bytes of direct memory still available for reservation.
///
/// Never goes below zero: a withdrawal larger than what is left fails
/// without touching the value.
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new(amount: u64) -> Counter {
        Counter(AtomicU64::new(amount))
    }

    /// Takes `amount` out if at least that much is left.
    pub fn withdraw(&self, amount: u64) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |left| {
                left.checked_sub(amount)
            })
            .is_ok()
    }

    /// Returns `amount` taken out earlier.
    pub fn deposit(&self, amount: u64) {
        self.0.fetch_add(amount, Ordering::Release);
    }

    /// Current value; concurrent reservations may change it right away.
    pub fn read(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }
}
