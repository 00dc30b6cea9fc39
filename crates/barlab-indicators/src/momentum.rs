//! Momentum indicators.

use barlab_core::traits::StreamingIndicator;

/// Relative Strength Index (RSI).
///
/// Measures the speed and magnitude of recent price changes
/// to evaluate overbought or oversold conditions.
///
/// Average gain and loss are seeded with the mean of the first `period`
/// close-to-close changes and then Wilder-smoothed with factor `1/period`.
/// The first value is therefore available after `period + 1` closes.
#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    seed_count: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
    current: Option<f64>,
}

impl Rsi {
    /// Create a new RSI indicator.
    ///
    /// Common periods are 14 (default) or 9.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            prev_close: None,
            seed_count: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            current: None,
        }
    }

    /// RSI from smoothed averages. A market with no movement at all reads 50.
    fn value(avg_gain: f64, avg_loss: f64) -> f64 {
        let total = avg_gain + avg_loss;
        if total == 0.0 {
            50.0
        } else {
            100.0 * avg_gain / total
        }
    }
}

impl StreamingIndicator for Rsi {
    type Output = f64;

    fn update(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;

        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        let period = self.period as f64;

        if self.seed_count < self.period {
            self.gain_sum += gain;
            self.loss_sum += loss;
            self.seed_count += 1;
            if self.seed_count < self.period {
                return None;
            }
            self.avg_gain = self.gain_sum / period;
            self.avg_loss = self.loss_sum / period;
        } else {
            // Wilder's smoothing: avg = (prev_avg * (period-1) + value) / period
            self.avg_gain = (self.avg_gain * (period - 1.0) + gain) / period;
            self.avg_loss = (self.avg_loss * (period - 1.0) + loss) / period;
        }

        self.current = Some(Self::value(self.avg_gain, self.avg_loss));
        self.current
    }

    fn current(&self) -> Option<f64> {
        self.current
    }

    fn reset(&mut self) {
        *self = Self::new(self.period);
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "RSI"
    }
}
