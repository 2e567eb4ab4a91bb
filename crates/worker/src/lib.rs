//! Thread primitives for background driver loops.
//!
//! * [`StopSignal`]: non-blocking, cloneable stop request
//! * [`SupervisedThread`]: named OS thread with an idempotent, multi-caller join
//! * [`panic_message`]: readable message from a panic payload

mod panic;
mod thread;
mod token;

pub use panic::panic_message;
pub use thread::{SupervisedThread, ThreadExit};
pub use token::StopSignal;
