//! In-process stand-ins for camera, microphone, encoder and media element.
//!
//! Lets the control surface run headless: devices grant synthetic tracks,
//! the encoder renders a tone for the recorded wall-clock span, and the
//! surface keeps a playback clock.

mod devices;
mod encoder;
mod surface;

pub(crate) use {
    devices::SyntheticDevices,
    encoder::ToneEncoderFactory,
    surface::HeadlessSurfaceFactory,
};

use crate::config::Config;

use std::sync::Arc;

use media_recorder_core::{HandleRegistry, MediaBackend};

/// Sample rate of rendered recordings (8-bit mono PCM).
pub(crate) const SAMPLE_RATE: u32 = 8_000;

/// Set to refuse every device request.
pub(crate) const DENY_DEVICES_ENV: &str = "MEDIA_RECORDER_DENY_DEVICES";

/// Builds a backend whose collaborators share one handle registry.
pub(crate) fn backend(config: &Config, deny_devices: bool) -> MediaBackend {
    let handles = Arc::new(HandleRegistry::new());

    MediaBackend {
        devices: Arc::new(SyntheticDevices::new(Arc::clone(&handles), deny_devices)),
        encoders: Arc::new(ToneEncoderFactory::new(Arc::clone(&handles))),
        handles,
        profile: config.media_profile(),
    }
}
