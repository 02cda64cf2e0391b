//! Media Recorder: headless record/playback control bar driven from stdin.

mod app;
mod app_command;
mod config;
mod controls;
mod error;
mod input_handler;
mod scrub_bar;
mod synthetic;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    controls::{ControlsOptions, RecorderControls, SurfaceFactory},
    error::{AppError, Result as AppResult},
    input_handler::InputHandler,
    scrub_bar::ScrubBar,
};

use crate::{config::Config, synthetic::HeadlessSurfaceFactory};

use std::{sync::Arc, time::Duration};

use media_recorder_core::SessionGroup;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "media_recorder=debug,media_recorder_core=debug";

/// Stdin reads run on a blocking thread that cannot be interrupted.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(200);

/// Application entry point.
fn main() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to create tokio runtime: {:?}", e);
            std::process::exit(1);
        }
    };

    rt.block_on(async {
        let deny_devices = std::env::var_os(synthetic::DENY_DEVICES_ENV).is_some();
        let backend = synthetic::backend(&config, deny_devices);
        let surfaces = HeadlessSurfaceFactory::new(Arc::clone(&backend.handles));
        let group = SessionGroup::new(backend);
        let events = group.subscribe().await;

        let options = ControlsOptions::from_config(&config, Some(surfaces.create("video")));
        let attached = RecorderControls::attach(group, options, &surfaces).await;
        let (controls, pending) = match attached {
            Ok(attached) => attached,
            Err(e) => {
                error!("Failed to bind controls: {:?}", e);
                std::process::exit(1);
            }
        };

        // Device prompts may never be answered; the app loop must not wait on them.
        tokio::spawn(async move {
            for failure in pending.run().await {
                warn!(member = failure.index, kind = %failure.kind, error = %failure.error, "Capture denied");
            }
        });

        info!("Type a command per line: advance, record, stop, play, pause, seek <secs>, scrub-start, scrub <secs>, scrub-end, remove, mute, unmute, status, quit");

        let (command_tx, command_rx) = mpsc::channel(32);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let input_handler = InputHandler::new(command_tx);

        let app = App {
            controls,
            command_rx,
            events,
            shutdown_tx,
            take_id: None,
        };

        tokio::join!(
            async {
                if let Err(e) = input_handler.run(shutdown_rx).await {
                    error!(error = ?e, "Input handler error");
                }
            },
            async {
                if let Err(e) = app.run().await {
                    error!(error = ?e, "App error");
                }
            }
        );
    });

    rt.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
}
