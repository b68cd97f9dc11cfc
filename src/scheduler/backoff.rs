use std::time::Duration;

// 2^16 times the base delay is already far beyond any useful retry
const MAX_EXPONENT: u32 = 16;

/// Delay before retry number `attempt` (1-based): `base × 2^(attempt − 1)`
pub fn retry_delay(base: Duration, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_EXPONENT);
    base.saturating_mul(1u32 << exponent)
}
