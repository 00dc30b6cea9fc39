//! Property tests for the streaming indicators.
//!
//! 1. SMA matches a brute-force trailing mean
//! 2. RSI stays in [0, 100] and ATR stays non-negative once available
//! 3. CrossOver fires once per sign change of the difference, never on a touch,
//!    and never on a constant price series
//! 4. Values are causal: appending bars never changes earlier snapshots

use barlab_core::traits::{BarIndicator, StreamingIndicator};
use barlab_core::types::Bar;
use barlab_indicators::{Atr, CrossDirection, CrossOver, IndicatorEngine, IndicatorSettings, Rsi, Sma};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec((1.0..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0), 1..300)
}

fn arb_bars() -> impl Strategy<Value = Vec<Bar>> {
    prop::collection::vec((1.0..500.0_f64, 0.0..0.05_f64, 0.0..0.05_f64), 1..200).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (close, up, down))| {
                Bar::new(i as i64 * 60_000, close, close * (1.0 + up), close * (1.0 - down), close, 100.0)
            })
            .collect()
    })
}

fn brute_force_sma(closes: &[f64], period: usize, index: usize) -> Option<f64> {
    (index + 1 >= period).then(|| closes[index + 1 - period..=index].iter().sum::<f64>() / period as f64)
}

proptest! {
    #[test]
    fn sma_matches_brute_force(closes in arb_closes(), period in 1usize..50) {
        let mut sma = Sma::new(period);
        for (i, &close) in closes.iter().enumerate() {
            let streamed = sma.update(close);
            let expected = brute_force_sma(&closes, period, i);
            match (streamed, expected) {
                (Some(s), Some(e)) => prop_assert!((s - e).abs() < 1e-6 * e.abs().max(1.0)),
                (None, None) => {}
                other => prop_assert!(false, "availability mismatch at {}: {:?}", i, other),
            }
        }
    }

    #[test]
    fn rsi_bounded(closes in arb_closes(), period in 1usize..30) {
        let mut rsi = Rsi::new(period);
        for (i, &close) in closes.iter().enumerate() {
            let value = rsi.update(close);
            prop_assert_eq!(value.is_some(), i >= period);
            if let Some(v) = value {
                prop_assert!((0.0..=100.0).contains(&v), "rsi {} out of range", v);
            }
        }
    }

    #[test]
    fn atr_non_negative(bars in arb_bars(), period in 1usize..30) {
        let mut atr = Atr::new(period);
        for (i, bar) in bars.iter().enumerate() {
            let value = atr.update(bar);
            prop_assert_eq!(value.is_some(), i >= period);
            if let Some(v) = value {
                prop_assert!(v >= 0.0);
            }
        }
    }

    #[test]
    fn flat_series_never_crosses(price in 0.0001f64..1e6, len in 1usize..400) {
        let settings = IndicatorSettings {
            fast_period: 5,
            slow_period: 20,
            rsi_period: 14,
            trend_period: Some(60),
            atr_period: Some(14),
        };
        let mut engine = IndicatorEngine::new(settings);
        for i in 0..len {
            let snapshot = engine.update(&Bar::new(i as i64 * 60_000, price, price, price, price, 100.0));
            prop_assert_eq!(snapshot.crossover, None);
        }
    }

    #[test]
    fn crossover_fires_once_per_sign_change(diffs in prop::collection::vec(-3i32..=3, 1..200)) {
        let mut cross = CrossOver::new();
        let mut last_nonzero: i32 = 0;
        let mut first = true;

        for &d in &diffs {
            let signal = cross.update(Some(d as f64), Some(0.0));
            let sign = d.signum();

            let expected = if first || sign == 0 || sign == last_nonzero {
                None
            } else if sign > 0 {
                Some(CrossDirection::Up)
            } else {
                Some(CrossDirection::Down)
            };
            prop_assert_eq!(signal, expected);
            if sign == 0 {
                prop_assert!(signal.is_none(), "fired on a touch");
            }

            if sign != 0 {
                last_nonzero = sign;
            }
            first = false;
        }
    }

    #[test]
    fn snapshots_are_causal(bars in arb_bars(), cut in 0usize..200) {
        let settings = IndicatorSettings {
            fast_period: 3,
            slow_period: 7,
            rsi_period: 5,
            trend_period: Some(12),
            atr_period: Some(4),
        };
        let cut = cut.min(bars.len());

        let mut full = IndicatorEngine::new(settings);
        let all: Vec<_> = bars.iter().map(|b| full.update(b)).collect();

        let mut prefix = IndicatorEngine::new(settings);
        let partial: Vec<_> = bars[..cut].iter().map(|b| prefix.update(b)).collect();

        prop_assert_eq!(&all[..cut], &partial[..]);
    }
}
