use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use kitchen_sim::config::{
    DEFAULT_BASE_DURATION, DEFAULT_COOKS, DEFAULT_ORDER_COUNT, DEFAULT_PROGRESS_STEPS,
    SessionConfig,
};
use kitchen_sim::{ExecutionMode, KitchenError, logging, sim};

/// Sequential vs concurrent kitchen: one blocking cook against a roster of cooks.
#[derive(Parser, Debug)]
#[command(name = "kitchen_sim", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run both modes on a small, fast kitchen and print a summary (default).
    Demo,
    /// Run one session and render every event.
    Run {
        /// Execution mode.
        #[arg(long, value_enum, default_value_t = ExecutionMode::Concurrent)]
        mode: ExecutionMode,

        /// Also render progress at every quarter.
        #[arg(long)]
        progress: bool,

        #[command(flatten)]
        kitchen: KitchenArgs,
    },
    /// Run both modes once and print CSV.
    Bench {
        #[command(flatten)]
        kitchen: KitchenArgs,
    },
    /// Sweep cook and order counts and print CSV.
    Stress {
        /// Comma-separated cook counts.
        #[arg(long, value_delimiter = ',', default_values_t = [1usize, 2, 3, 4, 8])]
        cook_sets: Vec<usize>,

        /// Comma-separated order counts.
        #[arg(long, value_delimiter = ',', default_values_t = [5usize, 10, 25])]
        order_sets: Vec<usize>,

        #[command(flatten)]
        kitchen: KitchenArgs,
    },
}

/// Kitchen settings shared by every subcommand that runs a session.
#[derive(Args, Debug, Clone)]
struct KitchenArgs {
    /// Orders generated for the session (1-50).
    ///
    /// Environment variable: `KITCHEN_ORDERS`
    #[arg(long, env = "KITCHEN_ORDERS", default_value_t = DEFAULT_ORDER_COUNT)]
    orders: usize,

    /// Base preparation time per order, in time units (1-5).
    ///
    /// Environment variable: `KITCHEN_BASE_DURATION`
    #[arg(long, env = "KITCHEN_BASE_DURATION", default_value_t = DEFAULT_BASE_DURATION)]
    base_duration: f64,

    /// Cooks in the concurrent mode.
    ///
    /// Environment variable: `KITCHEN_COOKS`
    #[arg(long, env = "KITCHEN_COOKS", default_value_t = DEFAULT_COOKS)]
    cooks: usize,

    /// Length of one time unit in milliseconds.
    ///
    /// Environment variable: `KITCHEN_TIME_UNIT_MS`
    #[arg(long, env = "KITCHEN_TIME_UNIT_MS", default_value_t = 1000)]
    time_unit_ms: u64,

    /// Seed for reproducible menus and cooking times.
    ///
    /// Environment variable: `KITCHEN_SEED`
    #[arg(long, env = "KITCHEN_SEED")]
    seed: Option<u64>,

    /// Track every handed-out order and report duplicates.
    #[arg(long)]
    validate: bool,
}

impl KitchenArgs {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            order_count: self.orders,
            base_duration: self.base_duration,
            cooks: self.cooks,
            time_unit: Duration::from_millis(self.time_unit_ms),
            progress_steps: DEFAULT_PROGRESS_STEPS,
            seed: self.seed,
        }
    }
}

fn main() {
    logging::init();
    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Demo) {
        Command::Demo => sim::run_demo(),
        Command::Run {
            mode,
            progress,
            kitchen,
        } => sim::run_single(mode, &kitchen.session_config(), kitchen.validate, progress),
        Command::Bench { kitchen } => {
            sim::run_benchmark(&kitchen.session_config(), kitchen.validate)
        }
        Command::Stress {
            cook_sets,
            order_sets,
            kitchen,
        } => sim::run_stress(
            &cook_sets,
            &order_sets,
            &kitchen.session_config(),
            kitchen.validate,
        ),
    };

    match result {
        Ok(()) => {}
        Err(err @ KitchenError::InvalidConfiguration(_)) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
        Err(err) => {
            tracing::error!(error = %err, "kitchen session failed");
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
