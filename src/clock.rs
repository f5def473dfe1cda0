//! Monotonic clock abstraction

use std::time::{Duration, Instant};

/// A monotonic clock for reading-time accounting.
///
/// The manual variant lets tests simulate elapsed time without sleeping.
#[derive(Debug, Clone, Copy)]
pub enum Clock {
    /// Real monotonic time measured from `origin`
    System {
        /// When the clock was created
        origin: Instant,
    },
    /// Simulated time, moved only by [`Clock::advance`]
    Manual {
        /// Time elapsed since the clock was created
        elapsed: Duration,
    },
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl Clock {
    /// A clock backed by `Instant`
    pub fn system() -> Self {
        Self::System { origin: Instant::now() }
    }

    /// A simulated clock starting at zero
    pub fn manual() -> Self {
        Self::Manual { elapsed: Duration::ZERO }
    }

    /// Time elapsed since the clock was created
    pub fn now(&self) -> Duration {
        match self {
            Self::System { origin } => origin.elapsed(),
            Self::Manual { elapsed } => *elapsed,
        }
    }

    /// Move a manual clock forward. Has no effect on a system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Self::Manual { elapsed } = self {
            *elapsed += delta;
        }
    }

    /// Whether this clock is simulated
    pub fn is_manual(&self) -> bool {
        matches!(self, Self::Manual { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_zero() {
        assert_eq!(Clock::manual().now(), Duration::ZERO);
    }

    #[test]
    fn manual_clock_advances() {
        let mut clock = Clock::manual();
        clock.advance(Duration::from_secs(90));
        clock.advance(Duration::from_secs(30));
        assert_eq!(clock.now(), Duration::from_secs(120));
    }

    #[test]
    fn system_clock_ignores_advance() {
        let mut clock = Clock::system();
        clock.advance(Duration::from_secs(3600));
        assert!(clock.now() < Duration::from_secs(3600));
        assert!(!clock.is_manual());
    }
}
