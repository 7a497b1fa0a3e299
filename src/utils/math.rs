pub fn simple_moving_average(window: &[f64]) -> Option<f64> {
    if window.is_empty() {
        None
    } else {
        Some(window.iter().sum::<f64>() / window.len() as f64)
    }
}

/// Smoothing factor of an EMA over `period` samples.
pub fn ema_alpha(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

pub fn ema_step(previous: f64, value: f64, alpha: f64) -> f64 {
    previous + alpha * (value - previous)
}
