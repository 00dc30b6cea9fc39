//! End-to-end runs over engineered price series.

use barlab_backtest::{BacktestConfig, BacktestEngine, BacktestReport, Simulation};
use barlab_core::{Bar, BarlabError, FillPrice, OrderStatus, Side};
use barlab_risk::PositionSizingMethod;
use barlab_strategies::{RuleSpec, StrategyConfig, StrategyRegistry, StrategyRules};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const DAY_MS: i64 = 86_400_000;

fn flat_bars(closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(i as i64 * DAY_MS, c, c, c, c, 1_000.0))
        .collect()
}

/// Golden cross on bar 5 (close 9), death cross on bar 9 (close 9) for SMA(2)/SMA(3).
const CROSS_SERIES: [f64; 12] = [10.0, 9.0, 8.0, 7.0, 8.0, 9.0, 10.0, 11.0, 10.0, 9.0, 8.0, 7.0];

fn cross_config(fill_price: FillPrice) -> BacktestConfig {
    BacktestConfig {
        initial_cash: dec!(1000),
        commission_rate: dec!(0.001),
        fill_price,
        record_indicators: false,
        strategy: StrategyConfig {
            fast_period: 2,
            slow_period: 3,
            ..StrategyConfig::default()
        }
        .with_rules(StrategyRules::Custom {
            entry: RuleSpec::GoldenCross,
            exit: RuleSpec::DeathCross,
        }),
        sizer: PositionSizingMethod::Fixed { shares: dec!(10) },
    }
}

fn run(config: BacktestConfig, bars: &[Bar]) -> BacktestReport {
    BacktestEngine::new(config).unwrap().run(bars).unwrap()
}

#[test]
fn test_constant_prices_never_trade() {
    let report = run(BacktestConfig::default(), &flat_bars(&[100.0; 60]));

    assert!(report.executions.is_empty());
    assert_eq!(report.stats.final_equity, dec!(10000));
    assert_eq!(report.stats.equity_curve.len(), 60);
    assert!(report.stats.equity_curve.iter().all(|(_, e)| *e == dec!(10000)));
    assert_eq!(report.stats.max_drawdown_pct, Decimal::ZERO);
}

#[test]
fn test_crossover_round_trip_at_close() {
    let report = run(cross_config(FillPrice::Close), &flat_bars(&CROSS_SERIES));

    assert_eq!(report.executions.len(), 2);
    let buy = &report.executions[0];
    assert_eq!((buy.status, buy.side), (OrderStatus::Filled, Side::Buy));
    assert_eq!(buy.bar_index, Some(5));
    assert_eq!(buy.price, Some(dec!(9)));
    assert_eq!(buy.commission, dec!(0.09));

    let sell = &report.executions[1];
    assert_eq!((sell.status, sell.side), (OrderStatus::Filled, Side::Sell));
    assert_eq!(sell.bar_index, Some(9));
    assert_eq!(sell.quantity, dec!(10));
    assert_eq!(sell.realized_pnl, Some(dec!(-0.18)));

    // Marked to market while long: 909.91 cash + 10 x close
    assert_eq!(report.stats.equity_curve[6].1, dec!(1009.91));
    assert_eq!(report.stats.equity_curve[7].1, dec!(1019.91));

    assert_eq!(report.stats.final_equity, dec!(999.82));
    assert_eq!(report.stats.total_trades, 1);
    assert_eq!(report.stats.losing_trades, 1);
    assert_eq!(report.stats.total_commission, dec!(0.18));
    assert_eq!(report.final_portfolio.position.quantity, Decimal::ZERO);
}

#[test]
fn test_crossover_round_trip_at_next_open() {
    let report = run(cross_config(FillPrice::NextOpen), &flat_bars(&CROSS_SERIES));

    assert_eq!(report.executions.len(), 2);
    let buy = &report.executions[0];
    assert_eq!(buy.bar_index, Some(6));
    assert_eq!(buy.price, Some(dec!(10)));

    let sell = &report.executions[1];
    assert_eq!(sell.bar_index, Some(10));
    assert_eq!(sell.price, Some(dec!(8)));
    assert_eq!(sell.realized_pnl, Some(dec!(-20.18)));

    assert_eq!(report.stats.final_equity, dec!(979.82));
    assert_eq!(buy.order_id.0 + 1, sell.order_id.0);
}

#[test]
fn test_queued_order_canceled_at_end_of_data() {
    let report = run(cross_config(FillPrice::NextOpen), &flat_bars(&CROSS_SERIES[..6]));

    assert_eq!(report.executions.len(), 1);
    let canceled = &report.executions[0];
    assert_eq!(canceled.status, OrderStatus::Canceled);
    assert_eq!(canceled.side, Side::Buy);
    assert_eq!(canceled.reason.as_deref(), Some("end of data"));
    assert_eq!(report.stats.canceled_orders, 1);
    assert_eq!(report.stats.final_equity, dec!(1000));
    assert_eq!(report.stats.equity_curve.len(), 6);
}

/// Slide from 100 to 80, stall, then climb 2 per bar. The stall keeps RSI
/// low, so the first uptick is a golden cross with RSI well under 45.
fn slide_stall_climb() -> Vec<f64> {
    let mut closes = vec![100.0; 5];
    closes.extend((1..=20).map(|i| 100.0 - i as f64));
    closes.extend([80.0; 20]);
    closes.push(81.0);
    closes.extend((1..=20).map(|i| 81.0 + 2.0 * i as f64));
    closes
}

#[test]
fn test_cross_rsi_entry_and_overbought_exit() {
    let config = BacktestConfig {
        record_indicators: true,
        strategy: StrategyConfig {
            rsi_oversold: None,
            ..StrategyConfig::default()
        },
        ..BacktestConfig::default()
    };
    let report = run(config, &flat_bars(&slide_stall_climb()));
    let indicators = report.indicators.as_ref().unwrap();

    assert_eq!(report.executions.len(), 2);
    let buy = &report.executions[0];
    assert_eq!(buy.side, Side::Buy);
    assert_eq!(buy.bar_index, Some(45));
    let entry_bar = indicators.get(45).unwrap();
    assert!(entry_bar.crossover.is_some());
    assert!(entry_bar.rsi.unwrap() <= 45.0);
    // floor(5000 / 81) shares, commission = price x size x rate
    assert_eq!(buy.quantity, dec!(61));
    assert_eq!(buy.price, Some(dec!(81)));
    assert_eq!(buy.commission, dec!(4.941));

    let sell = &report.executions[1];
    assert_eq!(sell.side, Side::Sell);
    assert_eq!(sell.bar_index, Some(48));
    assert!(indicators.get(47).unwrap().rsi.unwrap() < 70.0);
    assert!(indicators.get(48).unwrap().rsi.unwrap() >= 70.0);
    assert_eq!(sell.price, Some(dec!(87)));
    // (87 - 81) x 61 - 4.941 - 5.307
    assert_eq!(sell.realized_pnl, Some(dec!(355.752)));

    assert_eq!(report.final_portfolio.position.quantity, Decimal::ZERO);
    assert_eq!(report.stats.final_equity, dec!(10355.752));
    assert_eq!(report.stats.winning_trades, 1);
}

fn always_buy_config(percent: Decimal) -> BacktestConfig {
    BacktestConfig {
        initial_cash: dec!(1000),
        commission_rate: dec!(0.001),
        strategy: StrategyConfig::default().with_rules(StrategyRules::Custom {
            entry: RuleSpec::RsiAtMost { threshold: 100.0 },
            exit: RuleSpec::DeathCross,
        }),
        sizer: PositionSizingMethod::PercentOfCash { percent },
        ..BacktestConfig::default()
    }
}

#[test]
fn test_unaffordable_entry_is_rejected_every_bar() {
    // 10 shares at 100 plus commission needs 1001
    let report = run(always_buy_config(dec!(1)), &flat_bars(&[100.0; 30]));

    // RSI(14) is first defined on bar 14
    assert_eq!(report.executions.len(), 16);
    assert!(report.executions.iter().all(|e| e.status == OrderStatus::Rejected));
    assert_eq!(report.executions[0].bar_index, Some(14));
    assert!(report.executions[0].reason.as_deref().unwrap_or_default().contains("1001"));
    assert_eq!(report.stats.rejected_orders, 16);
    assert!(report.stats.trades.is_empty());
    assert_eq!(report.stats.final_equity, dec!(1000));
}

#[test]
fn test_affordable_entry_fills_once() {
    let report = run(always_buy_config(dec!(0.9)), &flat_bars(&[100.0; 30]));

    assert_eq!(report.executions.len(), 1);
    assert_eq!(report.executions[0].status, OrderStatus::Filled);
    assert_eq!(report.executions[0].quantity, dec!(9));
    assert_eq!(report.final_portfolio.position.quantity, dec!(9));
    assert_eq!(report.final_portfolio.cash, dec!(99.1));
}

#[test]
fn test_tiny_prices_size_to_zero() {
    // Half of 1000 over 1e-27 is beyond Decimal's range
    let report = run(always_buy_config(dec!(0.5)), &flat_bars(&[1e-27; 20]));

    assert_eq!(report.executions.len(), 6);
    assert!(report.executions.iter().all(|e| e.status == OrderStatus::Rejected));
    assert_eq!(report.executions[0].reason.as_deref(), Some("Order quantity is zero"));
    assert_eq!(report.stats.final_equity, dec!(1000));
}

#[test]
fn test_price_beyond_accounting_range_aborts_run() {
    let mut bars = flat_bars(&[100.0; 20]);
    bars[7] = Bar::new(bars[7].timestamp, 1e30, 1e30, 1e30, 1e30, 1_000.0);

    match BacktestEngine::new(BacktestConfig::default()).unwrap().run(&bars) {
        Err(BarlabError::Data(err)) => assert_eq!(err.bar_index(), Some(7)),
        other => panic!("expected data error, got {other:?}"),
    }
}

#[test]
fn test_runs_are_deterministic() {
    let bars: Vec<Bar> = (0..300)
        .map(|i| {
            let price = 100.0 + (i as f64 * 0.17).sin() * 12.0 + (i as f64 * 0.05).cos() * 5.0;
            Bar::new(i as i64 * DAY_MS, price, price + 1.5, price - 1.5, price, 10_000.0)
        })
        .collect();

    for fill_price in [FillPrice::Close, FillPrice::NextOpen] {
        let config = BacktestConfig {
            fill_price,
            ..BacktestConfig::default()
        };
        let first = run(config.clone(), &bars);
        let second = run(config, &bars);
        assert_eq!(first.stats, second.stats);
        assert_eq!(first.executions, second.executions);
        assert_eq!(first.final_portfolio, second.final_portfolio);
    }
}

proptest! {
    #[test]
    fn constant_prices_never_trade_at_any_level(price in 0.01f64..10_000.0) {
        let golden_cross = BacktestConfig {
            strategy: StrategyConfig::default().with_rules(StrategyRules::Custom {
                entry: RuleSpec::GoldenCross,
                exit: RuleSpec::DeathCross,
            }),
            ..BacktestConfig::default()
        };
        let trend_atr = BacktestConfig {
            strategy: StrategyRegistry::new().default_config("trend_atr").unwrap(),
            ..BacktestConfig::default()
        };

        let bars = flat_bars(&vec![price; 260]);
        for config in [golden_cross, trend_atr] {
            let report = run(config, &bars);
            prop_assert!(report.executions.is_empty(), "traded at constant price {}", price);
            prop_assert_eq!(report.stats.final_equity, dec!(10000));
        }
    }

    #[test]
    fn every_intent_gets_exactly_one_outcome(
        closes in prop::collection::vec(1.0f64..200.0, 1..150),
        next_open in any::<bool>(),
    ) {
        let config = BacktestConfig {
            fill_price: if next_open { FillPrice::NextOpen } else { FillPrice::Close },
            strategy: StrategyConfig {
                fast_period: 2,
                slow_period: 4,
                rsi_period: 3,
                rsi_entry_threshold: 60.0,
                rsi_exit_threshold: 55.0,
                ..StrategyConfig::default()
            },
            ..BacktestConfig::default()
        };
        let bars = flat_bars(&closes);

        let mut simulation = Simulation::new(config).unwrap();
        for bar in &bars {
            simulation.step(bar).unwrap();
            let decision = simulation.decision();
            let in_flight = decision.intents_emitted() - decision.outcomes_received();
            prop_assert!(in_flight <= 1);
            prop_assert_eq!(in_flight == 1, simulation.broker().has_queued());
            prop_assert!(simulation.broker().cash() >= Decimal::ZERO);
        }
        let intents = simulation.decision().intents_emitted();

        let report = simulation.finish();
        prop_assert_eq!(report.executions.len(), intents);
        prop_assert_eq!(report.stats.equity_curve.len(), bars.len());

        // Fills alternate buy, sell, buy, ...
        let fills: Vec<Side> = report
            .executions
            .iter()
            .filter(|e| e.status == OrderStatus::Filled)
            .map(|e| e.side)
            .collect();
        for (i, side) in fills.iter().enumerate() {
            let expected = if i % 2 == 0 { Side::Buy } else { Side::Sell };
            prop_assert_eq!(*side, expected);
        }
    }
}
