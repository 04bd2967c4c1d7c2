//! Demo, single-run, benchmark, and stress-sweep runners for the kitchen.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::config::SessionConfig;
use crate::console::{Console, FRAME_INTERVAL};
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::events::ChannelSink;
use crate::menu;
use crate::sequential::SequentialExecutor;
use crate::session::SessionReport;
use crate::types::ExecutionMode;
use crate::work::SimulatedCook;

// Demo knobs (small for quick CLI feedback).
const DEMO_ORDERS: usize = 6;
const DEMO_BASE_DURATION: f64 = 1.0;
const DEMO_TIME_UNIT_MS: u64 = 40;
const DEMO_SEED: u64 = 2432;

const CSV_HEADER: &str = "mode,cooks,orders,elapsed_ms,throughput_orders_per_s,max_in_flight,ui_max_stall_ms,cpu_user_s,cpu_sys_s,duplicate_orders,failed";

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    use libc::{RUSAGE_SELF, getrusage, rusage};
    // SAFETY: rusage is plain old data; all-zero is a valid value.
    let mut usage: rusage = unsafe { std::mem::zeroed() };
    // SAFETY: `usage` is a valid, writable rusage for the duration of the call.
    let rc = unsafe { getrusage(RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// A finished session plus what the presentation layer went through.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: SessionReport,
    /// Longest gap between two presentation frames.
    pub ui_max_stall: Duration,
    pub frames: u64,
    pub cpu_user_s: Option<f64>,
    pub cpu_sys_s: Option<f64>,
}

/// Run one session with the console (writing to `out`) as presentation layer.
///
/// The sequential mode cooks on this thread, so the console cannot draw a frame
/// until the queue is empty. The concurrent mode cooks on background threads
/// while this thread keeps drawing.
pub fn run_session<W: Write>(
    mode: ExecutionMode,
    config: &SessionConfig,
    validate: bool,
    out: W,
    show_progress: bool,
) -> Result<RunOutcome> {
    config.validate()?;
    let orders = menu::generate_orders(config.order_count, config.seed)?;
    let cook = SimulatedCook::new(config);
    let mut console = Console::new(out).with_progress(show_progress);
    let (tx, rx) = mpsc::channel();

    let cpu_start = cpu_times_seconds();
    // First frame: the window is up before the session starts.
    console.frame(&rx)?;
    let report = match mode {
        ExecutionMode::Sequential => {
            let executor = SequentialExecutor::new().with_validation(validate);
            executor.enqueue_all(orders);
            let report = executor.run(&cook, &ChannelSink::new(tx));
            console.frame(&rx)?;
            report
        }
        ExecutionMode::Concurrent => {
            let dispatcher = Dispatcher::new(config.cooks).with_validation(validate);
            dispatcher.enqueue_all(orders);
            let handle = dispatcher.start(Arc::new(cook), Arc::new(ChannelSink::new(tx)))?;
            loop {
                match console.frame(&rx) {
                    Ok(true) => break,
                    Ok(false) => thread::sleep(FRAME_INTERVAL),
                    Err(err) => {
                        // Stop handing out orders and let in-flight cooks finish.
                        tracing::warn!(error = %err, "console failed; cancelling session");
                        handle.cancel();
                        if let Err(wait_err) = handle.wait() {
                            tracing::error!(error = %wait_err, "session failed while cancelling");
                        }
                        return Err(err.into());
                    }
                }
            }
            handle.wait()?
        }
    };

    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };

    Ok(RunOutcome {
        report,
        ui_max_stall: console.clock().max_stall(),
        frames: console.clock().frames(),
        cpu_user_s,
        cpu_sys_s,
    })
}

fn csv_row(outcome: &RunOutcome) -> String {
    let report = &outcome.report;
    let cpu_user = outcome
        .cpu_user_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    let cpu_sys = outcome
        .cpu_sys_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    format!(
        "{},{},{},{:.2},{:.2},{},{:.2},{},{},{},{}",
        report.mode,
        report.cooks,
        report.total_orders,
        report.elapsed.as_secs_f64() * 1000.0,
        report.throughput(),
        report.max_in_flight,
        outcome.ui_max_stall.as_secs_f64() * 1000.0,
        cpu_user,
        cpu_sys,
        report.duplicate_deliveries,
        report.failed
    )
}

fn warn_on_leftovers(outcome: &RunOutcome) {
    let report = &outcome.report;
    if report.remaining > 0 {
        eprintln!("# warning,leftover_orders,{}", report.remaining);
    }
    if report.duplicate_deliveries > 0 {
        eprintln!("# violation,duplicate_orders");
    }
}

/// Run both modes on a small, fast kitchen and print a comparison.
pub fn run_demo() -> Result<()> {
    tracing::debug!("demo start");
    let config = SessionConfig {
        order_count: DEMO_ORDERS,
        base_duration: DEMO_BASE_DURATION,
        seed: Some(DEMO_SEED),
        ..SessionConfig::default()
    }
    .with_time_unit(Duration::from_millis(DEMO_TIME_UNIT_MS));

    let stdout = io::stdout();
    println!("== sequential: 1 cook, console blocked ==");
    let sequential =
        run_session(ExecutionMode::Sequential, &config, true, stdout.lock(), false)?;
    println!("== concurrent: {} cooks, console free ==", config.cooks);
    let concurrent =
        run_session(ExecutionMode::Concurrent, &config, true, stdout.lock(), false)?;

    let seq_ms = sequential.report.elapsed.as_secs_f64() * 1000.0;
    let conc_ms = concurrent.report.elapsed.as_secs_f64() * 1000.0;
    let speedup = if conc_ms > 0.0 { seq_ms / conc_ms } else { 0.0 };
    let all_processed = sequential.report.is_drained()
        && concurrent.report.is_drained()
        && sequential.report.processed == config.order_count
        && concurrent.report.processed == config.order_count;

    println!("DEMO SUMMARY");
    println!("orders={} cooks={}", config.order_count, config.cooks);
    println!("sequential_elapsed_ms={seq_ms:.0}");
    println!("concurrent_elapsed_ms={conc_ms:.0}");
    println!("speedup={speedup:.2}");
    println!(
        "sequential_ui_max_stall_ms={:.0}",
        sequential.ui_max_stall.as_secs_f64() * 1000.0
    );
    println!(
        "concurrent_ui_max_stall_ms={:.0}",
        concurrent.ui_max_stall.as_secs_f64() * 1000.0
    );
    println!("concurrent_per_cook={:?}", concurrent.report.per_slot);
    println!(
        "concurrent_max_in_flight={}",
        concurrent.report.max_in_flight
    );
    println!(
        "duplicate_orders={}",
        concurrent.report.duplicate_deliveries
    );
    println!("all_orders_processed={all_processed}");
    Ok(())
}

/// Run a single session, rendering every event to stdout.
pub fn run_single(
    mode: ExecutionMode,
    config: &SessionConfig,
    validate: bool,
    show_progress: bool,
) -> Result<()> {
    config.validate()?;
    println!("starting {} mode", mode.as_str().to_uppercase());
    println!("{} orders in the queue", config.order_count);
    let outcome = run_session(mode, config, validate, io::stdout().lock(), show_progress)?;
    println!(
        "ui_max_stall_ms={:.0}",
        outcome.ui_max_stall.as_secs_f64() * 1000.0
    );
    warn_on_leftovers(&outcome);
    Ok(())
}

/// Run both modes once with the same settings and print CSV.
pub fn run_benchmark(config: &SessionConfig, validate: bool) -> Result<()> {
    config.validate()?;
    println!("{CSV_HEADER}");
    for mode in [ExecutionMode::Sequential, ExecutionMode::Concurrent] {
        let outcome = run_session(mode, config, validate, io::sink(), false)?;
        println!("{}", csv_row(&outcome));
        warn_on_leftovers(&outcome);
    }
    Ok(())
}

/// Sweep cook and order counts and print CSV.
///
/// Each order count gets one sequential baseline row followed by one concurrent
/// row per cook count.
pub fn run_stress(
    cook_sets: &[usize],
    order_sets: &[usize],
    base: &SessionConfig,
    validate: bool,
) -> Result<()> {
    // Validate the whole sweep before printing anything.
    for &order_count in order_sets {
        for &cooks in cook_sets {
            SessionConfig {
                order_count,
                cooks,
                ..base.clone()
            }
            .validate()?;
        }
    }

    println!("{CSV_HEADER}");
    for &order_count in order_sets {
        let baseline = SessionConfig {
            order_count,
            ..base.clone()
        };
        let outcome =
            run_session(ExecutionMode::Sequential, &baseline, validate, io::sink(), false)?;
        println!("{}", csv_row(&outcome));
        for &cooks in cook_sets {
            let config = SessionConfig {
                order_count,
                cooks,
                ..base.clone()
            };
            let outcome =
                run_session(ExecutionMode::Concurrent, &config, validate, io::sink(), false)?;
            println!("{}", csv_row(&outcome));
            warn_on_leftovers(&outcome);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KitchenError;
    use std::time::Instant;

    /// Output that rejects every write, like a closed pipe.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn fast_config() -> SessionConfig {
        SessionConfig {
            order_count: 6,
            base_duration: 1.0,
            cooks: 3,
            progress_steps: 10,
            seed: Some(5),
            ..SessionConfig::default()
        }
        .with_time_unit(Duration::from_millis(10))
    }

    #[test]
    fn sequential_session_starves_the_console() {
        let config = fast_config();
        let sequential =
            run_session(ExecutionMode::Sequential, &config, false, io::sink(), false)
                .expect("sequential run failed");
        let concurrent =
            run_session(ExecutionMode::Concurrent, &config, true, io::sink(), false)
                .expect("concurrent run failed");

        assert_eq!(sequential.report.processed, 6);
        assert_eq!(concurrent.report.processed, 6);
        // The sequential console sees one gap spanning the whole session.
        assert!(sequential.ui_max_stall >= sequential.report.elapsed);
        assert!(concurrent.ui_max_stall < sequential.ui_max_stall);
        assert!(concurrent.frames > sequential.frames);
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let config = SessionConfig {
            cooks: 0,
            ..fast_config()
        };
        let err = run_session(ExecutionMode::Concurrent, &config, false, io::sink(), false)
            .expect_err("invalid config accepted");
        assert!(err.to_string().contains("cooks"));
    }

    #[test]
    fn csv_row_matches_header_width() {
        let outcome = run_session(
            ExecutionMode::Concurrent,
            &fast_config(),
            false,
            io::sink(),
            false,
        )
        .expect("run failed");
        let row = csv_row(&outcome);
        assert_eq!(row.split(',').count(), CSV_HEADER.split(',').count());
        assert!(row.starts_with("concurrent,3,6,"));
    }

    #[test]
    fn console_failure_cancels_and_joins_the_session() {
        let config = SessionConfig {
            order_count: 50,
            base_duration: 5.0,
            ..fast_config()
        };
        let started = Instant::now();
        let err = run_session(ExecutionMode::Concurrent, &config, false, ClosedPipe, false)
            .expect_err("write failure was swallowed");
        let took = started.elapsed();

        assert!(matches!(err, KitchenError::Io(_)));
        // The in-flight orders (at least 2.5 units each) were waited for.
        assert!(took >= Duration::from_millis(25), "returned after {took:?}");
        // The other orders were never handed out.
        assert!(took < Duration::from_millis(500), "returned after {took:?}");
    }
}
