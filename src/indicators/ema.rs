use crate::utils::math::{ema_alpha, ema_step, simple_moving_average};

/// EMA seeded with the simple average of its first `period` inputs.
#[derive(Debug, Clone)]
pub struct ExponentialMovingAverage {
    period: usize,
    alpha: f64,
    warmup: Vec<f64>,
    value: Option<f64>,
}

impl ExponentialMovingAverage {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            alpha: ema_alpha(period),
            warmup: Vec::with_capacity(period),
            value: None,
        }
    }

    pub fn update(&mut self, input: f64) -> Option<f64> {
        if let Some(prev) = self.value {
            let next = ema_step(prev, input, self.alpha);
            self.value = Some(next);
            return self.value;
        }

        self.warmup.push(input);
        if self.warmup.len() == self.period {
            self.value = simple_moving_average(&self.warmup);
            self.warmup.clear();
        }
        self.value
    }
}
