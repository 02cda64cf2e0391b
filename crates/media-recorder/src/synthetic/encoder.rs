use crate::synthetic::SAMPLE_RATE;

use std::{f64::consts::TAU, sync::Arc};

use async_trait::async_trait;
use media_recorder_core::{
    Blob, Encoder, EncoderError, EncoderFactory, FinalizedRecording, HandleRegistry,
    HandleTarget, LiveTrack, RecordingContainer, RecordingOptions,
};
use tokio::time::Instant;
use tracing::{debug, instrument};

const TONE_HZ: f64 = 440.0;
const AUDIO_MIME: &str = "audio/L8;rate=8000";
const VIDEO_MIME: &str = "video/x-synthetic";

/// Builds encoders that render a sine tone as long as they recorded.
pub(crate) struct ToneEncoderFactory {
    handles: Arc<HandleRegistry>,
}

impl ToneEncoderFactory {
    pub(crate) fn new(handles: Arc<HandleRegistry>) -> Self {
        Self { handles }
    }
}

impl EncoderFactory for ToneEncoderFactory {
    fn create(&self, track: &dyn LiveTrack, options: &RecordingOptions) -> Box<dyn Encoder> {
        debug!(track_id = track.id(), container = ?options.container, "Tone encoder created");

        Box::new(ToneEncoder {
            handles: Arc::clone(&self.handles),
            track_id: track.id().to_string(),
            options: *options,
            started_at: None,
        })
    }
}

struct ToneEncoder {
    handles: Arc<HandleRegistry>,
    track_id: String,
    options: RecordingOptions,
    started_at: Option<Instant>,
}

#[async_trait]
impl Encoder for ToneEncoder {
    fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    #[instrument(skip(self), fields(track_id = %self.track_id))]
    async fn finalize(&mut self) -> Result<FinalizedRecording, EncoderError> {
        let started_at = self
            .started_at
            .take()
            .ok_or_else(|| EncoderError::FinalizeFailed {
                reason: "encoder was never started".to_string(),
            })?;

        let seconds = started_at.elapsed().as_secs_f64();
        let mime = match self.options.container {
            RecordingContainer::Audio => AUDIO_MIME,
            RecordingContainer::Video => VIDEO_MIME,
        };
        let blob = Blob::new(mime, render_tone(seconds));
        let handle = self.handles.register(HandleTarget::Recording(blob.clone()));

        debug!(seconds, size_bytes = blob.len(), "Tone rendered");

        Ok(FinalizedRecording { handle, blob })
    }
}

/// Unsigned 8-bit mono PCM of a sine tone lasting `seconds`.
pub(crate) fn render_tone(seconds: f64) -> Vec<u8> {
    let samples = (seconds.max(0.0) * f64::from(SAMPLE_RATE)).round() as usize;

    (0..samples)
        .map(|i| {
            let phase = TAU * TONE_HZ * i as f64 / f64::from(SAMPLE_RATE);
            (128.0 + 64.0 * phase.sin()).round() as u8
        })
        .collect()
}
