//! Command channel between host threads and the filter thread.
//!
//! Commands carry a oneshot-style response channel so callers can block
//! for acknowledgment. The filter thread drains commands between update
//! cycles; a cycle in progress always runs to completion first.

use std::sync::mpsc;

use crate::core::types::{Covariance2D, Pose2D};

/// Commands accepted by the filter thread.
#[derive(Debug)]
pub enum LocalizerCommand {
    /// Replace the pose belief with a Gaussian around `mean` and reseed
    /// the particle cloud from it.
    SetPose {
        /// New mean pose.
        mean: Pose2D,
        /// New covariance (diagonal is used for seeding).
        covariance: Covariance2D,
    },

    /// Discard the pose belief and reseed uniformly over the map's free
    /// cells (kidnapped-robot recovery).
    GlobalInit,
}

/// Result of a command execution.
pub type CommandResult = Result<CommandResponse, String>;

/// Acknowledgment data from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResponse {
    /// Pose belief replaced.
    PoseSet,
    /// Global reinitialization performed.
    GlobalInitDone,
}

/// Command paired with its response channel.
pub struct CommandWithResponse {
    /// The command to execute.
    pub command: LocalizerCommand,
    /// Channel the filter thread acknowledges on.
    pub response_tx: mpsc::Sender<CommandResult>,
}

impl std::fmt::Debug for CommandWithResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandWithResponse")
            .field("command", &self.command)
            .field("response_tx", &"...")
            .finish()
    }
}

/// Sender end of the command channel (held by host threads).
pub type CommandSender = mpsc::Sender<CommandWithResponse>;

/// Receiver end of the command channel (held by the filter thread).
pub type CommandReceiver = mpsc::Receiver<CommandWithResponse>;

/// Create a new command channel pair.
pub fn create_command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::channel()
}

/// Send a command and block for its acknowledgment.
pub fn send_command_sync(
    sender: &CommandSender,
    command: LocalizerCommand,
    timeout_ms: u64,
) -> CommandResult {
    use std::time::Duration;

    let (response_tx, response_rx) = mpsc::channel();
    sender
        .send(CommandWithResponse {
            command,
            response_tx,
        })
        .map_err(|_| "filter thread not responding (channel closed)".to_string())?;

    response_rx
        .recv_timeout(Duration::from_millis(timeout_ms))
        .map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => "filter command timeout".to_string(),
            mpsc::RecvTimeoutError::Disconnected => "filter thread disconnected".to_string(),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_command_channel_roundtrip() {
        let (tx, rx) = create_command_channel();

        let (response_tx, response_rx) = mpsc::channel();
        tx.send(CommandWithResponse {
            command: LocalizerCommand::GlobalInit,
            response_tx,
        })
        .unwrap();

        let cmd = rx.recv().unwrap();
        assert!(matches!(cmd.command, LocalizerCommand::GlobalInit));
        cmd.response_tx
            .send(Ok(CommandResponse::GlobalInitDone))
            .unwrap();

        assert_eq!(
            response_rx.recv().unwrap(),
            Ok(CommandResponse::GlobalInitDone)
        );
    }

    #[test]
    fn test_send_command_sync() {
        let (tx, rx) = create_command_channel();

        let handle = thread::spawn(move || {
            while let Ok(cmd) = rx.recv_timeout(Duration::from_millis(100)) {
                let response = match cmd.command {
                    LocalizerCommand::SetPose { .. } => CommandResponse::PoseSet,
                    LocalizerCommand::GlobalInit => CommandResponse::GlobalInitDone,
                };
                cmd.response_tx.send(Ok(response)).ok();
            }
        });

        let result = send_command_sync(
            &tx,
            LocalizerCommand::SetPose {
                mean: Pose2D::new(1.0, 2.0, 0.0),
                covariance: Covariance2D::diagonal(0.1, 0.1, 0.05),
            },
            1000,
        );
        assert_eq!(result, Ok(CommandResponse::PoseSet));

        drop(tx);
        handle.join().unwrap();
    }

    #[test]
    fn test_send_command_sync_dead_receiver() {
        let (tx, rx) = create_command_channel();
        drop(rx);
        let result = send_command_sync(&tx, LocalizerCommand::GlobalInit, 100);
        assert!(result.is_err());
    }
}
