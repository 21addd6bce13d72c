//! Injected time source.
//!
//! Everything that needs "now" (challenge expiry, report windows, timestamps)
//! reads it from a [`Clock`] held in application state, so tests can pin and
//! advance time deterministically.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};

#[derive(Clone, Debug)]
pub enum Clock {
    /// Wall clock.
    System,
    /// Pinned instant shared by all clones; tests move it with [`Clock::advance`].
    Fixed(Arc<RwLock<DateTime<Utc>>>),
}

impl Default for Clock {
    fn default() -> Self {
        Clock::System
    }
}

impl Clock {
    pub fn fixed(start: DateTime<Utc>) -> Self {
        Clock::Fixed(Arc::new(RwLock::new(start)))
    }

    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(instant) => *instant.read().unwrap_or_else(|poisoned| poisoned.into_inner()),
        }
    }

    /// Moves a fixed clock forward; no-op on the system clock.
    pub fn advance(&self, delta: Duration) {
        if let Clock::Fixed(instant) = self {
            let mut guard = instant.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard += delta;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_is_stable_until_advanced() {
        let start = Utc::now();
        let clock = Clock::fixed(start);

        assert_eq!(clock.now(), start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::minutes(7));
        assert_eq!(clock.now(), start + Duration::minutes(7));
    }

    #[test]
    fn fixed_clock_clones_share_time() {
        let start = Utc::now();
        let clock = Clock::fixed(start);
        let other = clock.clone();

        clock.advance(Duration::seconds(30));
        assert_eq!(other.now(), start + Duration::seconds(30));
    }
}
