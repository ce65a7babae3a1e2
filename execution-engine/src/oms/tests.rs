use super::*;
use crate::exchange::SimulatedExchange;
use crate::risk::RiskConfig;

type Reports = Arc<Mutex<Vec<ExecutionReport>>>;

fn whitelist_config() -> RiskConfig {
    RiskConfig {
        max_order_size: 1000,
        max_open_contracts_per_instrument: 500,
        max_daily_volume_per_instrument: 2000,
        allowed_instruments: ["AAPL", "SPY", "MSFT"].iter().map(|s| s.to_string()).collect(),
        ..RiskConfig::default()
    }
}

fn manager_with(config: RiskConfig, exchange: Box<dyn Exchange>) -> (OrderManager, Reports) {
    let manager = OrderManager::new(Arc::new(RiskEngine::new(config)), exchange);
    let reports: Reports = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&reports);
    manager.set_execution_report_callback(Arc::new(move |report: &ExecutionReport| {
        sink.lock().unwrap().push(report.clone());
    }));
    (manager, reports)
}

fn create_test_manager() -> (OrderManager, Reports) {
    manager_with(whitelist_config(), Box::new(SimulatedExchange::new()))
}

#[test]
fn test_market_order_fills_and_updates_position() {
    let (manager, reports) = create_test_manager();

    let mut order = Order::market("test_0", "AAPL", OrderSide::Buy, 100);
    assert!(manager.send_order(&mut order));

    assert_eq!(order.status, OrderStatus::Filled);
    assert_eq!(order.filled_quantity, 100);
    assert!((order.average_filled_price - 150.10).abs() < 1e-9);

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.status, OrderStatus::Filled);
    assert_eq!(report.filled_quantity, 100);
    assert!((report.filled_price - 150.10).abs() < 1e-9);
    assert_eq!(report.cumulative_filled_quantity, 100);
    assert!(report.reject_reason.is_empty());

    let position = manager.position("AAPL").unwrap();
    assert_eq!(position.quantity, 100);
    assert!((position.average_entry_price - 150.10).abs() < 1e-9);
    assert_eq!(position.realized_pnl, 0.0);
}

#[test]
fn test_rejects_order_over_max_size() {
    // Scenario: max_order_size=1000, MARKET BUY AAPL qty=1500.
    let (manager, reports) = create_test_manager();

    let mut order = Order::market("test_0", "AAPL", OrderSide::Buy, 1500);
    assert!(!manager.send_order(&mut order));

    assert_eq!(order.status, OrderStatus::Rejected);
    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, OrderStatus::Rejected);
    assert_eq!(reports[0].reject_reason, "REJECTED_MAX_ORDER_SIZE");
    assert!(manager.position("AAPL").is_none());
}

#[test]
fn test_rejects_disallowed_instrument() {
    let (manager, reports) = create_test_manager();

    let mut order = Order::market("test_0", "GOOG", OrderSide::Buy, 10);
    assert!(!manager.send_order(&mut order));

    let reports = reports.lock().unwrap();
    assert_eq!(reports[0].reject_reason, "REJECTED_INSTRUMENT_NOT_ALLOWED");
}

#[test]
fn test_per_instrument_position_cap() {
    // First 300 fill; the second 300 would take MSFT past the 500 cap.
    let (manager, reports) = create_test_manager();

    let mut first = Order::market("test_0", "MSFT", OrderSide::Buy, 300);
    assert!(manager.send_order(&mut first));
    assert_eq!(first.status, OrderStatus::Filled);
    assert_eq!(manager.position("MSFT").unwrap().quantity, 300);

    let mut second = Order::market("test_1", "MSFT", OrderSide::Buy, 300);
    assert!(!manager.send_order(&mut second));
    assert_eq!(
        reports.lock().unwrap().last().unwrap().reject_reason,
        "REJECTED_MAX_OPEN_CONTRACTS_INSTRUMENT"
    );
    // The book is untouched by the rejection.
    assert_eq!(manager.position("MSFT").unwrap().quantity, 300);
}

#[test]
fn test_realized_pnl_on_round_trip() {
    // Buy 100 AAPL at the 150.10 nominal, sell back at 149.90.
    let (manager, _reports) = create_test_manager();

    let mut open = Order::market("test_0", "AAPL", OrderSide::Buy, 100);
    assert!(manager.send_order(&mut open));
    let mut close = Order::market("test_1", "AAPL", OrderSide::Sell, 100);
    assert!(manager.send_order(&mut close));

    let position = manager.position("AAPL").unwrap();
    assert_eq!(position.quantity, 0);
    assert_eq!(position.average_entry_price, 0.0);
    assert!(
        (position.realized_pnl - (-20.0)).abs() < 1e-6,
        "expected -20.00 realized, got {}",
        position.realized_pnl
    );
}

#[test]
fn test_daily_volume_cap_counts_both_sides() {
    let (manager, reports) = create_test_manager();

    // 5 round-trip legs of 400 = 2000 traded, right at the cap.
    for i in 0..5 {
        let side = if i % 2 == 0 { OrderSide::Buy } else { OrderSide::Sell };
        let mut order = Order::market(format!("test_{}", i), "MSFT", side, 400);
        assert!(manager.send_order(&mut order), "leg {} should pass", i);
    }

    let mut over = Order::market("test_5", "MSFT", OrderSide::Buy, 1);
    assert!(!manager.send_order(&mut over));
    assert_eq!(
        reports.lock().unwrap().last().unwrap().reject_reason,
        "REJECTED_MAX_DAILY_VOLUME_INSTRUMENT"
    );
}

#[test]
fn test_total_contracts_cap_across_instruments() {
    let config = RiskConfig {
        max_order_size: 1000,
        max_open_contracts_per_instrument: 500,
        max_total_contracts_across_all_instruments: 500,
        ..RiskConfig::default()
    };
    let (manager, reports) = manager_with(config, Box::new(SimulatedExchange::new()));

    let mut aapl = Order::market("test_0", "AAPL", OrderSide::Buy, 300);
    assert!(manager.send_order(&mut aapl));

    let mut spy = Order::market("test_1", "SPY", OrderSide::Buy, 300);
    assert!(!manager.send_order(&mut spy));
    assert_eq!(
        reports.lock().unwrap().last().unwrap().reject_reason,
        "REJECTED_MAX_OPEN_CONTRACTS_TOTAL"
    );
}

#[test]
fn test_invalid_parameters_reject_before_risk() {
    let (manager, reports) = create_test_manager();

    let mut no_instrument = Order::market("test_0", "", OrderSide::Buy, 10);
    assert!(!manager.send_order(&mut no_instrument));
    let mut zero_quantity = Order::market("test_1", "AAPL", OrderSide::Buy, 0);
    assert!(!manager.send_order(&mut zero_quantity));
    let mut free_limit = Order::limit("test_2", "AAPL", OrderSide::Buy, 10, 0.0);
    assert!(!manager.send_order(&mut free_limit));

    let reports = reports.lock().unwrap();
    assert_eq!(reports.len(), 3);
    assert!(reports
        .iter()
        .all(|r| r.status == OrderStatus::Rejected
            && r.reject_reason.starts_with("Invalid parameters")));
    // Validation failures never enter the book, so no id is assigned.
    assert_eq!(no_instrument.order_id, 0);
}

#[test]
fn test_cancel_acknowledged_limit_order() {
    // Booking venue: the limit order rests, gets cancelled, and a second
    // cancel finds it terminal.
    let (manager, reports) =
        manager_with(whitelist_config(), Box::new(SimulatedExchange::with_limit_booking()));

    let mut order = Order::limit("test_0", "AAPL", OrderSide::Buy, 10, 149.50);
    assert!(manager.send_order(&mut order));
    assert_eq!(order.status, OrderStatus::Acknowledged);

    assert!(manager.cancel_order("", Some("test_0")));
    {
        let reports = reports.lock().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].status, OrderStatus::Acknowledged);
        assert_eq!(reports[1].status, OrderStatus::Cancelled);
    }
    assert_eq!(
        manager.order(order.order_id).unwrap().status,
        OrderStatus::Cancelled
    );

    // Terminal now: the second attempt fails and emits nothing.
    assert!(!manager.cancel_order("", Some("test_0")));
    assert_eq!(reports.lock().unwrap().len(), 2);
}

#[test]
fn test_cancel_by_internal_id_and_misses() {
    let (manager, reports) =
        manager_with(whitelist_config(), Box::new(SimulatedExchange::with_limit_booking()));

    let mut order = Order::limit("test_0", "SPY", OrderSide::Sell, 5, 101.0);
    assert!(manager.send_order(&mut order));

    assert!(manager.cancel_order(&order.order_id.to_string(), None));
    // Unknown ids and unparsable ids without a client id both miss quietly.
    assert!(!manager.cancel_order("424242", None));
    assert!(!manager.cancel_order("not-a-number", None));
    assert_eq!(reports.lock().unwrap().len(), 2);
}

#[test]
fn test_cancel_filled_order_fails() {
    let (manager, _reports) = create_test_manager();

    let mut order = Order::market("test_0", "AAPL", OrderSide::Buy, 10);
    assert!(manager.send_order(&mut order));
    assert!(!manager.cancel_order(&order.order_id.to_string(), None));
}

#[test]
fn test_order_ids_strictly_increase() {
    let (manager, _reports) = create_test_manager();

    let mut ids = Vec::new();
    for i in 0..5 {
        let mut order = Order::market(format!("test_{}", i), "AAPL", OrderSide::Buy, 10);
        manager.send_order(&mut order);
        ids.push(order.order_id);
    }
    // A risk-rejected order still consumes an id.
    let mut rejected = Order::market("test_big", "AAPL", OrderSide::Buy, 5000);
    assert!(!manager.send_order(&mut rejected));
    ids.push(rejected.order_id);

    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]), "ids: {:?}", ids);
}

#[test]
fn test_position_matches_signed_fill_sum() {
    let (manager, reports) = create_test_manager();

    let legs = [
        (OrderSide::Buy, 120),
        (OrderSide::Sell, 50),
        (OrderSide::Buy, 30),
        (OrderSide::Sell, 200),
    ];
    for (i, (side, quantity)) in legs.iter().enumerate() {
        let mut order = Order::market(format!("test_{}", i), "SPY", *side, *quantity);
        assert!(manager.send_order(&mut order));
    }

    let expected: i64 = reports
        .lock()
        .unwrap()
        .iter()
        .map(|report| {
            let side = manager.order(report.order_id).unwrap().side;
            side.signed(report.filled_quantity)
        })
        .sum();
    assert_eq!(expected, -100);
    assert_eq!(manager.position("SPY").unwrap().quantity, expected);
}

/// Venue stub that fills a fixed quantity per call, for exercising the
/// partial-fill path.
struct PartialFillExchange {
    fill_quantity: i64,
    price: f64,
}

impl Exchange for PartialFillExchange {
    fn execute(&self, order: &Order) -> ExchangeOutcome {
        ExchangeOutcome::Filled {
            price: self.price,
            quantity: self.fill_quantity.min(order.remaining_quantity()),
        }
    }
}

#[test]
fn test_partial_fill_keeps_order_cancelable() {
    let (manager, reports) = manager_with(
        RiskConfig::default(),
        Box::new(PartialFillExchange {
            fill_quantity: 40,
            price: 100.0,
        }),
    );

    let mut order = Order::market("test_0", "AAPL", OrderSide::Buy, 100);
    assert!(manager.send_order(&mut order));
    assert_eq!(order.status, OrderStatus::PartiallyFilled);
    assert_eq!(order.filled_quantity, 40);
    assert_eq!(manager.position("AAPL").unwrap().quantity, 40);

    assert!(manager.cancel_order(&order.order_id.to_string(), None));
    let reports = reports.lock().unwrap();
    assert_eq!(reports[0].status, OrderStatus::PartiallyFilled);
    assert_eq!(reports[1].status, OrderStatus::Cancelled);
    // The cancel does not undo the filled portion.
    assert_eq!(manager.position("AAPL").unwrap().quantity, 40);
}

#[test]
fn test_average_price_is_notional_over_quantity() {
    let (manager, reports) =
        manager_with(RiskConfig::default(), Box::new(SimulatedExchange::with_limit_booking()));

    let mut order = Order::limit("test_0", "AAPL", OrderSide::Buy, 100, 15.0);
    assert!(manager.send_order(&mut order));

    // Two uneven fills at different prices: 60 @ 10 + 40 @ 20 = 1400 / 100.
    manager.apply_fill(&mut order, 10.0, 60);
    assert_eq!(order.status, OrderStatus::PartiallyFilled);
    manager.apply_fill(&mut order, 20.0, 40);
    assert_eq!(order.status, OrderStatus::Filled);
    assert!((order.average_filled_price - 14.0).abs() < 1e-9);
    assert_eq!(order.filled_quantity, order.quantity);

    let reports = reports.lock().unwrap();
    let last = reports.last().unwrap();
    assert_eq!(last.cumulative_filled_quantity, 100);
    assert!((last.average_filled_price - 14.0).abs() < 1e-9);

    let position = manager.position("AAPL").unwrap();
    assert_eq!(position.quantity, 100);
    assert!((position.average_entry_price - 14.0).abs() < 1e-9);
}

#[test]
fn test_short_then_cover_realizes_pnl() {
    let (manager, _reports) = create_test_manager();

    // Short 50 AAPL at 149.90, cover at 150.10: realized -10.00.
    let mut short = Order::market("test_0", "AAPL", OrderSide::Sell, 50);
    assert!(manager.send_order(&mut short));
    let position = manager.position("AAPL").unwrap();
    assert_eq!(position.quantity, -50);
    assert!((position.average_entry_price - 149.90).abs() < 1e-9);

    let mut cover = Order::market("test_1", "AAPL", OrderSide::Buy, 50);
    assert!(manager.send_order(&mut cover));
    let position = manager.position("AAPL").unwrap();
    assert!(position.is_flat());
    assert!((position.realized_pnl - (-10.0)).abs() < 1e-6);
}

#[test]
fn test_risk_state_mirrors_positions() {
    let (manager, _reports) = create_test_manager();

    let mut buy = Order::market("test_0", "AAPL", OrderSide::Buy, 200);
    manager.send_order(&mut buy);
    let mut sell = Order::market("test_1", "SPY", OrderSide::Sell, 80);
    manager.send_order(&mut sell);

    assert_eq!(manager.risk.instrument_state("AAPL").net_position, 200);
    assert_eq!(manager.risk.instrument_state("SPY").net_position, -80);
    assert_eq!(manager.risk.total_open_contracts(), 280);
}
