//! Kitchen simulation contrasting a sequential cook with a roster of concurrent
//! cooks fed from one lock-guarded order queue.

pub mod config;
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod logging;
pub mod menu;
pub mod sequential;
pub mod session;
pub mod sim;
pub mod task_queue;
pub mod types;
pub mod work;

pub use config::SessionConfig;
pub use dispatcher::{Dispatcher, SessionHandle};
pub use error::{EmptyQueue, KitchenError, WorkError};
pub use events::{ChannelSink, EventSink, KitchenEvent, MemorySink, NullSink};
pub use sequential::SequentialExecutor;
pub use session::SessionReport;
pub use task_queue::OrderQueue;
pub use types::{ExecutionMode, Order, SlotId};
pub use work::{OrderProcessor, SimulatedCook};
