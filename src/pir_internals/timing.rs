use std::time::Instant;

/// Logs, at debug level, how long the operation `name` has been running since `start`.
#[inline]
pub fn time_track(start: Instant, name: &str) {
    let elapsed = start.elapsed();
    tracing::debug!(operation = name, elapsed_ms = elapsed.as_secs_f64() * 1e3, "{} took {:?}", name, elapsed);
}
