//! Volatility indicators.

use barlab_core::traits::BarIndicator;
use barlab_core::types::Bar;

/// Average True Range (ATR).
///
/// Measures market volatility by decomposing the entire range
/// of an asset price for that period.
///
/// True range needs the previous close, so the first bar only primes the
/// indicator. The first `period` true ranges are averaged to seed the value,
/// which is Wilder-smoothed afterwards.
#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    seed_count: usize,
    tr_sum: f64,
    current: Option<f64>,
}

impl Atr {
    /// Create a new ATR indicator.
    ///
    /// Common period is 14.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self {
            period,
            prev_close: None,
            seed_count: 0,
            tr_sum: 0.0,
            current: None,
        }
    }
}

impl BarIndicator for Atr {
    type Output = f64;

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let prev_close = self.prev_close.replace(bar.close)?;
        let tr = bar.true_range(Some(prev_close));
        let period = self.period as f64;

        self.current = match self.current {
            Some(atr) => Some((atr * (period - 1.0) + tr) / period),
            None => {
                self.tr_sum += tr;
                self.seed_count += 1;
                (self.seed_count == self.period).then(|| self.tr_sum / period)
            }
        };

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
        "ATR"
    }
}
