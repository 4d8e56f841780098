use std::time::Duration;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    NoRetry,
    RetryAfter(Duration),
}

/// Fixed-backoff retry policy. Every failure is treated as transient.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts including the first; 0 means unbounded.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, request_delay: Duration, backoff_factor: u32) -> Self {
        Self {
            max_attempts,
            backoff: request_delay.saturating_mul(backoff_factor),
        }
    }

    /// `attempt` is 1-based and names the attempt that just failed.
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if self.max_attempts != 0 && attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.backoff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_delay_times_factor() {
        let p = RetryPolicy::new(5, Duration::from_millis(2500), 2);
        assert_eq!(p.backoff, Duration::from_secs(5));
        assert_eq!(
            p.decide(1),
            RetryDecision::RetryAfter(Duration::from_secs(5))
        );
        assert_eq!(
            p.decide(4),
            RetryDecision::RetryAfter(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_respects_max_attempts() {
        let p = RetryPolicy::new(3, Duration::ZERO, 2);
        assert!(matches!(p.decide(2), RetryDecision::RetryAfter(_)));
        assert_eq!(p.decide(3), RetryDecision::NoRetry);
        assert_eq!(p.decide(7), RetryDecision::NoRetry);
    }

    #[test]
    fn test_single_attempt_never_retries() {
        let p = RetryPolicy::new(1, Duration::from_secs(1), 2);
        assert_eq!(p.decide(1), RetryDecision::NoRetry);
    }

    #[test]
    fn test_zero_means_unbounded() {
        let p = RetryPolicy::new(0, Duration::from_millis(10), 2);
        assert_eq!(
            p.decide(u32::MAX),
            RetryDecision::RetryAfter(Duration::from_millis(20))
        );
    }
}
