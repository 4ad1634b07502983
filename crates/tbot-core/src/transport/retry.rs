use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base: Duration,
    /// Upper bound for any single delay.
    pub max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.base.min(self.max),
            max: self.max,
        }
    }
}

/// Endless exponential delay sequence: base, 2*base, 4*base, ... capped.
#[derive(Clone, Debug)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = current
            .checked_mul(2)
            .map_or(self.max, |d| d.min(self.max));
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_from_base_and_caps_at_max() {
        let delays: Vec<u64> = RetryPolicy::default()
            .backoff()
            .take(9)
            .map(|d| d.as_secs())
            .collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 32, 60, 60, 60]);
    }

    #[test]
    fn base_above_max_is_clamped() {
        let mut b = RetryPolicy::new(Duration::from_secs(90), Duration::from_secs(60)).backoff();
        assert_eq!(b.next(), Some(Duration::from_secs(60)));
        assert_eq!(b.next(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn huge_delays_do_not_overflow() {
        let mut b = RetryPolicy::new(Duration::MAX / 2 + Duration::from_secs(1), Duration::MAX)
            .backoff();
        b.next();
        assert_eq!(b.next(), Some(Duration::MAX));
    }
}
