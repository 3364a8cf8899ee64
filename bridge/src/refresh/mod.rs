//! Background maintenance tasks around the deployment manager.

pub mod scheduler;

pub use scheduler::{RolloutScheduler, SchedulerConfig};
