// Estimator constants (no magic values)

/// No job is ever reported as dispatching sooner than this (5s)
pub const MIN_DISPATCH_DELAY_MS: i64 = 5_000;

/// Remaining time assumed for a running job that has overrun its estimate (120s)
pub const OVERRUN_FALLBACK_MS: i64 = 120_000;
