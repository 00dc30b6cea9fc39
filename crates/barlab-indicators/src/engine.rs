//! Per-bar indicator bundle used by the strategy.

use barlab_core::traits::{BarIndicator, StreamingIndicator};
use barlab_core::types::Bar;
use serde::{Deserialize, Serialize};

use crate::crossover::{CrossDirection, CrossOver};
use crate::momentum::Rsi;
use crate::moving_average::Sma;
use crate::volatility::Atr;

/// Which indicators to maintain and their periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorSettings {
    pub fast_period: usize,
    pub slow_period: usize,
    pub rsi_period: usize,
    /// Long SMA for trend context (e.g. 200)
    pub trend_period: Option<usize>,
    pub atr_period: Option<usize>,
}

impl Default for IndicatorSettings {
    fn default() -> Self {
        Self {
            fast_period: 5,
            slow_period: 20,
            rsi_period: 14,
            trend_period: None,
            atr_period: None,
        }
    }
}

impl IndicatorSettings {
    /// Bars needed before every configured indicator is available.
    pub fn warmup_period(&self) -> usize {
        [
            Some(self.slow_period),
            Some(self.fast_period),
            Some(self.rsi_period + 1),
            self.trend_period,
            self.atr_period.map(|p| p + 1),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0)
    }
}

/// Indicator values after a bar. `None` means "not yet available".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub bar_index: usize,
    pub timestamp: i64,
    pub close: f64,
    pub sma_fast: Option<f64>,
    pub sma_slow: Option<f64>,
    pub sma_trend: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    /// Fast SMA crossing the slow SMA on this bar
    pub crossover: Option<CrossDirection>,
}

impl IndicatorSnapshot {
    /// Crossover as +1 / -1 / 0.
    pub fn crossover_value(&self) -> i8 {
        self.crossover.map_or(0, CrossDirection::signum)
    }

    /// ATR as a fraction of the close.
    pub fn atr_ratio(&self) -> Option<f64> {
        self.atr.map(|atr| atr / self.close)
    }
}

/// Streaming indicator set, updated once per bar.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    settings: IndicatorSettings,
    sma_fast: Sma,
    sma_slow: Sma,
    sma_trend: Option<Sma>,
    rsi: Rsi,
    atr: Option<Atr>,
    crossover: CrossOver,
    bars_seen: usize,
}

impl IndicatorEngine {
    /// Build the indicator set. Periods must already be validated (> 0).
    pub fn new(settings: IndicatorSettings) -> Self {
        Self {
            settings,
            sma_fast: Sma::new(settings.fast_period),
            sma_slow: Sma::new(settings.slow_period),
            sma_trend: settings.trend_period.map(Sma::new),
            rsi: Rsi::new(settings.rsi_period),
            atr: settings.atr_period.map(Atr::new),
            crossover: CrossOver::new(),
            bars_seen: 0,
        }
    }

    pub fn settings(&self) -> &IndicatorSettings {
        &self.settings
    }

    /// Number of bars consumed so far.
    pub fn bars_seen(&self) -> usize {
        self.bars_seen
    }

    /// Consume the next bar and return every indicator's current value.
    pub fn update(&mut self, bar: &Bar) -> IndicatorSnapshot {
        let close = bar.close;
        let sma_fast = self.sma_fast.update(close);
        let sma_slow = self.sma_slow.update(close);
        let sma_trend = self.sma_trend.as_mut().and_then(|sma| sma.update(close));
        let rsi = self.rsi.update(close);
        let atr = self.atr.as_mut().and_then(|atr| atr.update(bar));
        let crossover = self.crossover.update(sma_fast, sma_slow);

        let snapshot = IndicatorSnapshot {
            bar_index: self.bars_seen,
            timestamp: bar.timestamp,
            close,
            sma_fast,
            sma_slow,
            sma_trend,
            rsi,
            atr,
            crossover,
        };
        self.bars_seen += 1;
        snapshot
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.settings);
    }
}

/// Snapshots recorded for every bar of a run, for plotting or inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSeries {
    snapshots: Vec<IndicatorSnapshot>,
}

impl IndicatorSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            snapshots: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, snapshot: IndicatorSnapshot) {
        self.snapshots.push(snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, bar_index: usize) -> Option<&IndicatorSnapshot> {
        self.snapshots.get(bar_index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &IndicatorSnapshot> {
        self.snapshots.iter()
    }

    /// One column of the series, aligned 1:1 with bars.
    pub fn column(&self, select: impl Fn(&IndicatorSnapshot) -> Option<f64>) -> Vec<Option<f64>> {
        self.snapshots.iter().map(select).collect()
    }

    /// Render as CSV (`timestamp,close,sma_fast,...`), empty cells for unavailable values.
    pub fn to_csv(&self) -> csv::Result<String> {
        let cell = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record(["timestamp", "close", "sma_fast", "sma_slow", "sma_trend", "rsi", "atr", "crossover"])?;
        for s in &self.snapshots {
            writer.write_record([
                s.timestamp.to_string(),
                s.close.to_string(),
                cell(s.sma_fast),
                cell(s.sma_slow),
                cell(s.sma_trend),
                cell(s.rsi),
                cell(s.atr),
                s.crossover_value().to_string(),
            ])?;
        }
        let data = writer.into_inner().map_err(|err| err.into_error())?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(i as i64 * 86_400_000, c, c + 1.0, c - 1.0, c, 1000.0))
            .collect()
    }

    fn settings() -> IndicatorSettings {
        IndicatorSettings {
            fast_period: 2,
            slow_period: 4,
            rsi_period: 3,
            trend_period: Some(5),
            atr_period: Some(2),
        }
    }

    #[test]
    fn test_warmup_period() {
        assert_eq!(settings().warmup_period(), 5);
        assert_eq!(IndicatorSettings::default().warmup_period(), 20);

        let long_rsi = IndicatorSettings {
            rsi_period: 40,
            ..IndicatorSettings::default()
        };
        assert_eq!(long_rsi.warmup_period(), 41);
    }

    #[test]
    fn test_engine_availability() {
        let mut engine = IndicatorEngine::new(settings());
        let snapshots: Vec<_> = bars(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0])
            .iter()
            .map(|b| engine.update(b))
            .collect();

        assert!(snapshots[0].sma_fast.is_none());
        assert_eq!(snapshots[1].sma_fast, Some(10.5));
        assert!(snapshots[2].sma_slow.is_none());
        assert_eq!(snapshots[3].sma_slow, Some(11.5));
        assert!(snapshots[2].rsi.is_none());
        assert_eq!(snapshots[3].rsi, Some(100.0));
        assert!(snapshots[1].atr.is_none());
        assert!(snapshots[2].atr.is_some());
        assert!(snapshots[3].sma_trend.is_none());
        assert_eq!(snapshots[4].sma_trend, Some(12.0));

        assert_eq!(snapshots[5].bar_index, 5);
        assert_eq!(engine.bars_seen(), 6);
    }

    #[test]
    fn test_optional_indicators_absent() {
        let mut engine = IndicatorEngine::new(IndicatorSettings {
            trend_period: None,
            atr_period: None,
            ..settings()
        });
        for bar in bars(&[10.0; 10]) {
            let snapshot = engine.update(&bar);
            assert!(snapshot.sma_trend.is_none());
            assert!(snapshot.atr.is_none());
            assert!(snapshot.atr_ratio().is_none());
        }
    }

    #[test]
    fn test_engine_golden_cross() {
        let mut engine = IndicatorEngine::new(settings());
        let closes = [10.0, 10.0, 10.0, 10.0, 9.0, 8.0, 12.0, 14.0];
        let crosses: Vec<i8> = bars(&closes)
            .iter()
            .map(|b| engine.update(b).crossover_value())
            .collect();

        // fast (2) dips below slow (4) at bar 4, recovers above at bar 6
        assert_eq!(crosses, vec![0, 0, 0, 0, -1, 0, 1, 0]);
    }

    #[test]
    fn test_reset_replays_identically() {
        let input = bars(&[10.0, 12.0, 11.0, 13.0, 12.5, 14.0, 13.0]);
        let mut engine = IndicatorEngine::new(settings());
        let first: Vec<_> = input.iter().map(|b| engine.update(b)).collect();
        engine.reset();
        let second: Vec<_> = input.iter().map(|b| engine.update(b)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_series_recording() {
        let mut engine = IndicatorEngine::new(settings());
        let mut series = IndicatorSeries::new();
        for bar in bars(&[10.0, 11.0, 12.0]) {
            series.push(engine.update(&bar));
        }

        assert_eq!(series.len(), 3);
        assert_eq!(series.column(|s| s.sma_fast), vec![None, Some(10.5), Some(11.5)]);

        let csv = series.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("timestamp,close"));
        assert_eq!(lines[1], "0,10,,,,,,0");
    }

    #[test]
    fn test_flat_series_never_crosses() {
        let price = 24.560000000000002;
        let settings = IndicatorSettings {
            trend_period: Some(50),
            ..IndicatorSettings::default()
        };
        let mut engine = IndicatorEngine::new(settings);
        for bar in bars(&[price; 200]) {
            let snapshot = engine.update(&bar);
            assert_eq!(snapshot.crossover, None, "crossover on bar {}", snapshot.bar_index);
        }
    }
}
