//! Shared state and command plumbing between threads.

mod commands;
mod shared;

pub use commands::{
    create_command_channel, send_command_sync, CommandReceiver, CommandResponse, CommandResult,
    CommandSender, CommandWithResponse, LocalizerCommand,
};
pub use shared::{create_estimate_handle, EstimateHandle, PoseEstimate};
