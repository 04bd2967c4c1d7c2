//! Session-level properties of the dispatcher and the sequential baseline.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use kitchen_sim::menu::generate_orders;
use kitchen_sim::{
    Dispatcher, ExecutionMode, KitchenEvent, MemorySink, SequentialExecutor, SessionConfig,
    SimulatedCook,
};

fn config(order_count: usize, cooks: usize, base_duration: f64, unit_ms: u64) -> SessionConfig {
    SessionConfig {
        order_count,
        base_duration,
        cooks,
        progress_steps: 20,
        seed: Some(99),
        ..SessionConfig::default()
    }
    .with_time_unit(Duration::from_millis(unit_ms))
}

fn session_finished_count(events: &[KitchenEvent]) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, KitchenEvent::SessionFinished { .. }))
        .count()
}

#[test]
fn every_queue_length_and_roster_size_drains_exactly_once() {
    for orders in [0usize, 1, 2, 5, 9] {
        for cooks in [1usize, 2, 3, 7] {
            let config = config(orders.max(1), cooks, 1.0, 1);
            let dispatcher = Dispatcher::new(cooks).with_validation(true);
            dispatcher.enqueue_all(generate_orders(orders, config.seed).expect("menu"));
            let sink = Arc::new(MemorySink::new());
            let report = dispatcher
                .run(Arc::new(SimulatedCook::new(&config)), sink.clone())
                .expect("session failed");

            assert_eq!(report.processed, orders, "orders={orders} cooks={cooks}");
            assert_eq!(report.duplicate_deliveries, 0);
            assert!(report.is_drained());
            assert_eq!(
                report.max_in_flight,
                cooks.min(orders),
                "orders={orders} cooks={cooks}"
            );
            let busy_slots = report.per_slot.iter().filter(|&&count| count > 0).count();
            if orders <= cooks {
                assert_eq!(busy_slots, orders, "orders={orders} cooks={cooks}");
            }

            let events = sink.events();
            assert_eq!(session_finished_count(&events), 1);

            let mut completions: HashMap<String, usize> = HashMap::new();
            for event in &events {
                if let KitchenEvent::Completed { order, .. } = event {
                    *completions.entry(order.label.clone()).or_default() += 1;
                }
            }
            assert_eq!(completions.len(), orders);
            assert!(completions.values().all(|&count| count == 1));
        }
    }
}

#[test]
fn progress_never_goes_backwards_per_order() {
    let config = config(8, 3, 1.0, 5);
    let dispatcher = Dispatcher::new(3);
    dispatcher.enqueue_all(generate_orders(8, config.seed).expect("menu"));
    let sink = Arc::new(MemorySink::new());
    dispatcher
        .run(Arc::new(SimulatedCook::new(&config)), sink.clone())
        .expect("session failed");

    let mut last: HashMap<String, u8> = HashMap::new();
    for event in sink.events() {
        match event {
            KitchenEvent::Progress { order, percent, .. } => {
                let prev = last.insert(order.label.clone(), percent);
                assert!(prev.is_none_or(|prev| prev <= percent));
            }
            KitchenEvent::Completed { order, .. } => {
                assert_eq!(last.get(&order.label), Some(&100));
            }
            _ => {}
        }
    }
    assert_eq!(last.len(), 8);
}

#[test]
fn concurrent_kitchen_is_more_than_twice_as_fast() {
    let config = config(10, 3, 2.0, 20);
    let orders = generate_orders(config.order_count, config.seed).expect("menu");

    let sequential = SequentialExecutor::new();
    sequential.enqueue_all(orders.clone());
    let seq = sequential.run(&SimulatedCook::new(&config), &MemorySink::new());

    let dispatcher = Dispatcher::new(config.cooks);
    dispatcher.enqueue_all(orders);
    let conc = dispatcher
        .run(
            Arc::new(SimulatedCook::new(&config)),
            Arc::new(MemorySink::new()),
        )
        .expect("session failed");

    assert_eq!(seq.mode, ExecutionMode::Sequential);
    assert_eq!(conc.mode, ExecutionMode::Concurrent);
    assert_eq!(seq.processed, 10);
    assert_eq!(conc.processed, 10);
    assert_eq!(conc.max_in_flight, 3);
    assert!(
        conc.elapsed < seq.elapsed / 2,
        "concurrent {:?} vs sequential {:?}",
        conc.elapsed,
        seq.elapsed
    );
    // Sequential: ten orders of 2.5..3.5 units of 20ms each.
    assert!(seq.elapsed >= Duration::from_millis(500));
    assert!(conc.throughput() > seq.throughput());
}

#[test]
fn cancelled_session_accounts_for_every_order() {
    let config = config(30, 3, 1.0, 10);
    let dispatcher = Dispatcher::new(3);
    dispatcher.enqueue_all(generate_orders(30, config.seed).expect("menu"));
    let sink = Arc::new(MemorySink::new());
    let handle = dispatcher
        .start(Arc::new(SimulatedCook::new(&config)), sink.clone())
        .expect("start failed");
    std::thread::sleep(Duration::from_millis(30));
    handle.cancel();
    let report = handle.wait().expect("session failed");

    assert!(report.cancelled);
    assert!(report.remaining > 0);
    assert_eq!(report.processed + report.failed + report.remaining, 30);
    assert_eq!(session_finished_count(&sink.events()), 1);
}
