//! Moving average indicators.

use std::collections::VecDeque;

use barlab_core::traits::StreamingIndicator;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values. Keeps a running
/// sum over a bounded window, so each update is O(1). The sum is rebuilt
/// from the window once every `period` slides so rounding error cannot
/// accumulate over long series.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    window: VecDeque<f64>,
    sum: f64,
    slides: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            window: VecDeque::with_capacity(period + 1),
            sum: 0.0,
            slides: 0,
        }
    }
}

impl StreamingIndicator for Sma {
    type Output = f64;

    fn update(&mut self, value: f64) -> Option<f64> {
        self.window.push_back(value);
        self.sum += value;

        // Sliding window
        if self.window.len() > self.period {
            if let Some(oldest) = self.window.pop_front() {
                self.sum -= oldest;
                self.slides += 1;
            }
            if self.slides == self.period {
                self.sum = self.window.iter().sum();
                self.slides = 0;
            }
        }

        self.current()
    }

    fn current(&self) -> Option<f64> {
        (self.window.len() == self.period).then(|| self.sum / self.period as f64)
    }

    fn reset(&mut self) {
        self.window.clear();
        self.sum = 0.0;
        self.slides = 0;
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}
