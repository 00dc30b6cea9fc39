//! Entry filters.

use std::fmt;

use crate::rules::MarketContext;

/// Gate applied on top of the entry rule. Exits are never filtered.
pub trait SignalFilter: Send + Sync + fmt::Debug {
    fn allows(&self, ctx: &MarketContext<'_>) -> bool;

    fn name(&self) -> &str;
}

/// Volatility band: ATR / close must lie in `[min_pct, max_pct]`.
///
/// Fails while ATR is unavailable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtrBandFilter {
    pub min_pct: f64,
    pub max_pct: Option<f64>,
}

impl AtrBandFilter {
    pub fn new(min_pct: f64, max_pct: Option<f64>) -> Self {
        Self { min_pct, max_pct }
    }
}

impl SignalFilter for AtrBandFilter {
    fn allows(&self, ctx: &MarketContext<'_>) -> bool {
        let Some(ratio) = ctx.indicators.atr_ratio() else {
            return false;
        };
        ratio >= self.min_pct && self.max_pct.map_or(true, |max| ratio <= max)
    }

    fn name(&self) -> &str {
        "atr_band"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barlab_core::types::Bar;
    use barlab_indicators::IndicatorSnapshot;

    fn snapshot(close: f64, atr: Option<f64>) -> IndicatorSnapshot {
        IndicatorSnapshot {
            bar_index: 0,
            timestamp: 0,
            close,
            sma_fast: None,
            sma_slow: None,
            sma_trend: None,
            rsi: None,
            atr,
            crossover: None,
        }
    }

    fn allows(filter: &AtrBandFilter, atr: Option<f64>) -> bool {
        let bar = Bar::new(0, 100.0, 100.0, 100.0, 100.0, 0.0);
        let snap = snapshot(100.0, atr);
        filter.allows(&MarketContext::new(&bar, &snap))
    }

    #[test]
    fn test_band_bounds() {
        let filter = AtrBandFilter::new(0.01, Some(0.05));
        assert!(!allows(&filter, Some(0.5))); // 0.5%
        assert!(allows(&filter, Some(1.0))); // exactly 1%
        assert!(allows(&filter, Some(3.0)));
        assert!(allows(&filter, Some(5.0)));
        assert!(!allows(&filter, Some(6.0)));
    }

    #[test]
    fn test_open_upper_bound() {
        let filter = AtrBandFilter::new(0.02, None);
        assert!(allows(&filter, Some(40.0)));
        assert!(!allows(&filter, Some(1.0)));
    }

    #[test]
    fn test_unavailable_atr_fails() {
        let filter = AtrBandFilter::new(0.0, None);
        assert!(!allows(&filter, None));
    }
}
