//! Observation queueing, update scheduling, and the filter thread.

mod filter_thread;
mod queue;
mod update_scheduler;

pub use filter_thread::FilterThread;
pub use queue::{observation_channel, ObservationSender, PushError};
pub use update_scheduler::{SchedulerConfig, UpdateScheduler};
