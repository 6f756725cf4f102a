//! Encoding Task Engine
//!
//! Background re-encoding through an external encoder process.
//!
//! ```text
//! Pending -> Running -> Completed | Failed | Cancelled
//! ```
//!
//! A terminal state is set once and never left. Cancellation takes priority
//! over every other terminal classification.

mod command;
mod engine;
mod progress;
mod registry;
mod request;
mod task;

pub use command::*;
pub use engine::{EncodingEngine, TaskEvent, TaskHandle};
pub use progress::*;
pub use registry::*;
pub use request::*;
pub use task::*;
