//! End-to-end properties of the simulation: determinism, book integrity,
//! populate behavior and manual order semantics.

use std::sync::Arc;
use std::time::Duration;

use simulation::{Controller, SimConfig, SimulationError};
use types::{OrderSide, OrderType, Price};

fn test_config(seed: u64) -> SimConfig {
    SimConfig {
        seed,
        ticks_per_day: 1_440,
        reference_ticks_per_day: 1_440,
        populate_ticks_per_day: 288,
        populate_fine_ticks_per_day: 576,
        populate_fine_days: 1,
        tick_rate_ms: 1,
        ..Default::default()
    }
}

fn wait_for_populate(controller: &Arc<Controller>) {
    for _ in 0..1_200 {
        if !controller.is_populating() {
            return;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    panic!("populate did not finish");
}

#[test]
fn same_seed_produces_identical_runs() {
    let a = Controller::new(test_config(7)).unwrap();
    let b = Controller::new(test_config(7)).unwrap();

    a.step(400).unwrap();
    b.step(400).unwrap();

    let ma = a.metrics();
    let mb = b.metrics();
    assert_eq!(ma.total_trades, mb.total_trades);
    assert_eq!(ma.total_orders, mb.total_orders);
    assert_eq!(ma.returns, mb.returns);

    let ta = a.recent_trades(200);
    let tb = b.recent_trades(200);
    assert_eq!(ta, tb);

    for (ia, ib) in a.instruments().iter().zip(b.instruments().iter()) {
        assert_eq!(ia.symbol, ib.symbol);
        assert!((ia.price - ib.price).abs() < 1e-12);
        assert!((ia.fundamental - ib.fundamental).abs() < 1e-12);
    }
}

#[test]
fn book_is_never_crossed_after_matching() {
    let controller = Controller::new(test_config(11)).unwrap();

    for _ in 0..40 {
        controller.step(10).unwrap();
        for view in controller.instruments() {
            let snapshot = controller.order_book(&view.symbol, 10).unwrap();
            if let (Some(bid), Some(ask)) = (snapshot.best_bid, snapshot.best_ask) {
                assert!(
                    bid < ask,
                    "{}: crossed book bid={bid:?} ask={ask:?}",
                    view.symbol
                );
            }
        }
    }
}

#[test]
fn populate_then_trade_end_to_end() {
    let controller = Controller::new(test_config(13)).unwrap();
    controller.populate(3, "2025-03-01").unwrap();
    wait_for_populate(&controller);

    let state = controller.state();
    assert_eq!(state.sim_date, "2025-03-04");
    assert!(state.current_tick > 0);

    // History populated: candles exist for every instrument.
    let bulk = controller.candles_bulk(sim_core::CandleInterval::H1, 0);
    for (symbol, candles) in &bulk {
        assert!(!candles.is_empty(), "no hourly candles for {symbol}");
    }

    // The since-cursor prunes older bars.
    let (symbol, all) = bulk.iter().next().unwrap();
    let mid_time = all[all.len() / 2].time;
    let recent = controller
        .candles(symbol, sim_core::CandleInterval::H1, mid_time, 10_000)
        .unwrap();
    assert!(recent.len() < all.len());
    assert!(recent.iter().all(|c| c.time >= mid_time));

    // The populated book accepts a manual order immediately.
    let report = controller
        .submit_order("NTX", OrderSide::Buy, OrderType::Market, 5)
        .unwrap();
    assert_eq!(report.requested, 5);
}

#[test]
fn populate_is_exclusive() {
    let controller = Controller::new(test_config(17)).unwrap();
    controller.populate(10, "2025-01-01").unwrap();

    match controller.populate(2, "2026-01-01") {
        Err(SimulationError::Rejected(_)) => {}
        other => panic!("expected rejection, got {other:?}"),
    }

    wait_for_populate(&controller);
    assert_eq!(controller.state().populate.current_day, 10);
}

#[test]
fn manual_limit_order_rests_and_later_cancels_nothing() {
    let controller = Controller::new(test_config(19)).unwrap();

    // Resting bid far below the market: pending, zero filled.
    let report = controller
        .submit_order(
            "OILC",
            OrderSide::Buy,
            OrderType::Limit {
                price: Price::from_float(0.05),
            },
            10,
        )
        .unwrap();
    assert_eq!(report.filled, 0);

    // The book now shows the resting external order.
    let snapshot = controller.order_book("OILC", 10).unwrap();
    let resting: u64 = snapshot.bids.iter().map(|l| l.quantity).sum();
    assert!(resting >= 10);
}

#[test]
fn external_trades_conserve_cash_against_population() {
    let controller = Controller::new(test_config(23)).unwrap();
    controller.step(200).unwrap();

    let before: f64 = controller
        .agent_summaries()
        .iter()
        .map(|s| s.total_cash)
        .sum();

    // A market buy transfers cash from the external account to sellers.
    let report = controller
        .submit_order("NTX", OrderSide::Buy, OrderType::Market, 20)
        .unwrap();

    let after: f64 = controller
        .agent_summaries()
        .iter()
        .map(|s| s.total_cash)
        .sum();

    let paid = report.avg_price * report.filled as f64;
    assert!(
        (after - before - paid).abs() < 1e-6,
        "population cash changed by {} but external paid {}",
        after - before,
        paid
    );
}

#[test]
fn restore_preserves_candles() {
    let controller = Controller::new(test_config(29)).unwrap();
    controller.populate(2, "2025-01-01").unwrap();
    wait_for_populate(&controller);

    let candles_before = controller.candles_bulk(sim_core::CandleInterval::D1, 0);

    let snapshot = simulation::RestoreSnapshot {
        date: "2025-09-01".to_string(),
        tick: 0,
        prices: controller
            .instruments()
            .into_iter()
            .map(|v| (v.symbol, 100.0))
            .collect(),
    };
    controller.restore(&snapshot).unwrap();

    // Restore reseeds clock and prices but never touches candle history.
    assert_eq!(controller.state().sim_date, "2025-09-01");
    let candles_after = controller.candles_bulk(sim_core::CandleInterval::D1, 0);
    assert_eq!(candles_before, candles_after);
}
