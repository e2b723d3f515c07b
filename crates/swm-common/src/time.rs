//! ---
//! swm_section: "01-core-functionality"
//! swm_subsection: "module"
//! swm_type: "source"
//! swm_scope: "code"
//! swm_description: "Shared primitives and utilities for the fleet runtime."
//! swm_version: "v0.0.0-prealpha"
//! swm_owner: "tbd"
//! ---
use std::time::Duration;

/// Signed difference between an observed and an expected period, in microseconds.
pub fn jitter_us(actual: Duration, expected: Duration) -> i64 {
    let actual_us = actual.as_secs_f64() * 1_000_000.0;
    let expected_us = expected.as_secs_f64() * 1_000_000.0;
    (actual_us - expected_us).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_is_signed() {
        let expected = Duration::from_millis(10);
        assert_eq!(jitter_us(Duration::from_micros(10_250), expected), 250);
        assert_eq!(jitter_us(Duration::from_micros(9_900), expected), -100);
    }
}
