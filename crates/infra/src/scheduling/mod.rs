//! Background task hosting for the phase scheduler

pub mod error;
pub mod timer_driver;

pub use error::{SchedulerError, SchedulerResult};
pub use timer_driver::{TimerDriver, TimerDriverConfig};
