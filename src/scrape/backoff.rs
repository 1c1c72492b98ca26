use rand::Rng;
use std::time::Duration;

/// Exponential backoff delay with ±30% jitter for retry `attempt` (0-based).
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    // Cap the exponent to prevent overflow
    let capped_attempt = attempt.min(6);

    let base_millis = base.as_millis().min(u64::MAX as u128) as u64;
    let delay = base_millis.saturating_mul(2_u64.saturating_pow(capped_attempt));

    let jitter_factor = rand::thread_rng().gen_range(0.7..1.3);
    Duration::from_millis((delay as f64 * jitter_factor).round() as u64)
}
