//! Human-like pacing between browser actions
//!
//! The inter-lead 10–30 s gap is an anti-detection requirement, not a
//! tunable.

use rand::Rng;
use std::time::Duration;

pub const INTER_LEAD_MIN_SECS: u64 = 10;
pub const INTER_LEAD_MAX_SECS: u64 = 30;

pub const INTER_MESSAGE_MIN_SECS: u64 = 30;
pub const INTER_MESSAGE_MAX_SECS: u64 = 90;

pub const TYPING_MIN_MS: u64 = 20;
pub const TYPING_MAX_MS: u64 = 50;

/// Uniform random duration in `[min_ms, max_ms]`
pub fn random_ms(min_ms: u64, max_ms: u64) -> Duration {
    Duration::from_millis(rand::rng().random_range(min_ms..=max_ms))
}

/// Sleep uniformly between `min_secs` and `max_secs`
pub async fn random_delay(min_secs: u64, max_secs: u64) {
    tokio::time::sleep(random_ms(min_secs * 1000, max_secs * 1000)).await;
}

/// Sleep uniformly between `min_ms` and `max_ms` milliseconds
pub async fn random_delay_ms(min_ms: u64, max_ms: u64) {
    tokio::time::sleep(random_ms(min_ms, max_ms)).await;
}

/// The required gap between two invite attempts
pub async fn inter_lead_delay() {
    random_delay(INTER_LEAD_MIN_SECS, INTER_LEAD_MAX_SECS).await;
}

/// Per-character typing delay
pub fn typing_delay() -> Duration {
    random_ms(TYPING_MIN_MS, TYPING_MAX_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_ms_stays_in_range() {
        for _ in 0..100 {
            let d = random_ms(10_000, 30_000);
            assert!(d >= Duration::from_millis(10_000));
            assert!(d <= Duration::from_millis(30_000));
        }
    }

    #[test]
    fn test_random_ms_degenerate_range() {
        assert_eq!(random_ms(500, 500), Duration::from_millis(500));
    }

    #[test]
    fn test_typing_delay_range() {
        for _ in 0..100 {
            let d = typing_delay();
            assert!(d >= Duration::from_millis(TYPING_MIN_MS));
            assert!(d <= Duration::from_millis(TYPING_MAX_MS));
        }
    }
}
