//! Typed gesture reader.
//!
//! Reads one command per line, parses it and forwards it to the main
//! application over an async channel.

use crate::{AppCommand, AppError, AppResult};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::{mpsc, watch},
};
use tracing::{debug, info, instrument, warn};

/// Forwards typed commands to the application.
pub struct InputHandler {
    command_tx: mpsc::Sender<AppCommand>,
}

impl InputHandler {
    pub fn new(command_tx: mpsc::Sender<AppCommand>) -> Self {
        Self { command_tx }
    }

    /// Read commands from standard input until shutdown.
    #[instrument(skip_all)]
    pub async fn run(&self, shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        self.run_with(BufReader::new(tokio::io::stdin()), shutdown_rx)
            .await
    }

    /// Read commands from `reader` until shutdown or end of input.
    ///
    /// Unparsable lines are logged and skipped. End of input requests
    /// shutdown.
    #[instrument(skip_all)]
    pub async fn run_with<R>(
        &self,
        reader: R,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Input handler shutting down");
                    return Ok(());
                }

                line = lines.next_line() => {
                    match line? {
                        Some(line) if line.trim().is_empty() => continue,
                        Some(line) => match AppCommand::parse(&line) {
                            Ok(command) => {
                                debug!(command = ?command, "Command read");
                                self.send(command).await?;
                                if command == AppCommand::Shutdown {
                                    return Ok(());
                                }
                            }
                            Err(e) => warn!(error = %e, "Ignoring input"),
                        },
                        None => {
                            info!("Input closed");
                            self.send(AppCommand::Shutdown).await?;
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: format!("Failed to send {:?}: {}", command, e),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
