use crate::{AppError, AppResult};

use std::{panic::Location, str::FromStr};

use error_location::ErrorLocation;

/// Commands sent from the input handler to the main application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppCommand {
    /// The single record/stop/play/pause button.
    Advance,
    /// Start recording.
    Record,
    /// Stop recording or playback.
    Stop,
    /// Start playback.
    Play,
    /// Pause playback.
    Pause,
    /// Jump every member to a position in seconds.
    Seek(f64),
    /// The scrub bar was grabbed.
    ScrubStart,
    /// The scrub bar was released.
    ScrubEnd,
    /// The scrub bar was dragged to a position in seconds.
    Scrub(f64),
    /// Discard the recordings and return to the live preview.
    RemoveRecording,
    /// Mute or unmute playback.
    SetMuted(bool),
    /// Log the group snapshot.
    Status,
    /// Request application shutdown.
    Shutdown,
}

impl AppCommand {
    /// Parses one typed line.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidCommand`] for unknown words, missing or
    /// unparsable positions, and trailing arguments.
    #[track_caller]
    pub fn parse(line: &str) -> AppResult<Self> {
        let caller = Location::caller();
        let invalid = |reason: &str| AppError::InvalidCommand {
            input: line.to_string(),
            reason: reason.to_string(),
            location: ErrorLocation::from(caller),
        };

        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or_else(|| invalid("empty command"))?
            .to_ascii_lowercase();

        let command = match verb.as_str() {
            "advance" | "toggle" => AppCommand::Advance,
            "record" => AppCommand::Record,
            "stop" => AppCommand::Stop,
            "play" => AppCommand::Play,
            "pause" => AppCommand::Pause,
            "seek" | "scrub" => {
                let seconds = words
                    .next()
                    .ok_or_else(|| invalid("missing position in seconds"))?
                    .parse::<f64>()
                    .map_err(|e| invalid(&format!("bad position: {}", e)))?;

                if !seconds.is_finite() || seconds < 0.0 {
                    return Err(invalid("position must be a non-negative number"));
                }

                if verb == "seek" {
                    AppCommand::Seek(seconds)
                } else {
                    AppCommand::Scrub(seconds)
                }
            }
            "scrub-start" => AppCommand::ScrubStart,
            "scrub-end" => AppCommand::ScrubEnd,
            "remove" => AppCommand::RemoveRecording,
            "mute" => AppCommand::SetMuted(true),
            "unmute" => AppCommand::SetMuted(false),
            "status" => AppCommand::Status,
            "quit" | "exit" => AppCommand::Shutdown,
            _ => return Err(invalid("unknown command")),
        };

        if words.next().is_some() {
            return Err(invalid("unexpected arguments"));
        }

        Ok(command)
    }
}

impl FromStr for AppCommand {
    type Err = AppError;

    #[track_caller]
    fn from_str(s: &str) -> AppResult<Self> {
        Self::parse(s)
    }
}
