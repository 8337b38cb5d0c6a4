//! Dedicated filter thread.
//!
//! Wraps the scheduler in a poll loop: drain pending commands, then
//! wait briefly for the next observation. Cancellation is checked once
//! per iteration, so an update cycle in progress always runs to
//! completion before the thread exits.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::core::types::Observation;
use crate::scheduler::update_scheduler::UpdateScheduler;
use crate::state::CommandReceiver;

/// Handle to the running filter thread.
pub struct FilterThread {
    handle: JoinHandle<()>,
}

impl FilterThread {
    /// Spawn the filter thread around an already-constructed scheduler.
    ///
    /// Construction (and with it config validation) happens on the
    /// caller's thread, so an invalid setup fails before anything runs.
    pub fn spawn(
        mut scheduler: UpdateScheduler,
        observations: Receiver<Observation>,
        commands: CommandReceiver,
        running: Arc<AtomicBool>,
        poll_interval: Duration,
    ) -> Self {
        let handle = thread::Builder::new()
            .name("amcl-filter".to_string())
            .spawn(move || {
                log::info!("filter thread started");

                while running.load(Ordering::Relaxed) {
                    // Commands apply between cycles.
                    while let Ok(cmd) = commands.try_recv() {
                        let result = scheduler.handle_command(cmd.command);
                        cmd.response_tx.send(result).ok();
                    }

                    match observations.recv_timeout(poll_interval) {
                        Ok(observation) => scheduler.handle(observation),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => {
                            log::info!("observation queue closed, filter thread exiting");
                            break;
                        }
                    }
                }

                log::info!("filter thread stopped");
            })
            .expect("Failed to spawn filter thread");

        Self { handle }
    }

    /// Wait for the thread to exit.
    pub fn join(self) {
        if self.handle.join().is_err() {
            log::error!("filter thread panicked");
        }
    }
}
