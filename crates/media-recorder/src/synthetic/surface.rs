use crate::{SurfaceFactory, synthetic::SAMPLE_RATE};

use std::sync::Arc;

use media_recorder_core::{HandleRegistry, HandleTarget, MediaHandle, PlaybackSurface};
use tokio::time::Instant;
use tracing::debug;

/// A media element without pixels: tracks source, volume and a playback clock.
pub(crate) struct HeadlessSurface {
    name: String,
    handles: Arc<HandleRegistry>,
    source: Option<MediaHandle>,
    offset: f64,
    playing_since: Option<Instant>,
    volume: f64,
    muted: bool,
    autoplay: bool,
}

impl HeadlessSurface {
    pub(crate) fn new(name: impl Into<String>, handles: Arc<HandleRegistry>) -> Self {
        Self {
            name: name.into(),
            handles,
            source: None,
            offset: 0.0,
            playing_since: None,
            volume: 1.0,
            muted: false,
            autoplay: true,
        }
    }

    pub(crate) fn is_playing(&self) -> bool {
        self.playing_since.is_some()
    }
}

impl PlaybackSurface for HeadlessSurface {
    fn set_source(&mut self, handle: &MediaHandle) {
        self.source = Some(handle.clone());
        self.offset = 0.0;
        self.playing_since = self.autoplay.then(Instant::now);

        debug!(surface = %self.name, source = %handle, "Source bound");
    }

    fn play(&mut self) {
        let duration = self.duration();
        if duration.is_finite() && self.offset >= duration {
            self.offset = 0.0;
        }

        if self.playing_since.is_none() {
            self.playing_since = Some(Instant::now());
        }
    }

    fn pause(&mut self) {
        self.offset = self.current_time();
        self.playing_since = None;
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn set_autoplay(&mut self, autoplay: bool) {
        self.autoplay = autoplay;
    }

    fn current_time(&self) -> f64 {
        let running = self
            .playing_since
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or(0.0);

        (self.offset + running).min(self.duration())
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.offset = seconds.max(0.0).min(self.duration());
        if self.playing_since.is_some() {
            self.playing_since = Some(Instant::now());
        }
    }

    fn duration(&self) -> f64 {
        match self.source.as_ref().and_then(|h| self.handles.resolve(h)) {
            Some(HandleTarget::Stream { .. }) => f64::INFINITY,
            Some(HandleTarget::Recording(blob)) => blob.len() as f64 / f64::from(SAMPLE_RATE),
            None => 0.0,
        }
    }

    fn muted(&self) -> bool {
        self.muted
    }

    fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn has_ended(&self) -> bool {
        let duration = self.duration();
        self.is_playing() && duration.is_finite() && self.current_time() >= duration
    }
}

/// Creates headless surfaces on demand.
pub(crate) struct HeadlessSurfaceFactory {
    handles: Arc<HandleRegistry>,
}

impl HeadlessSurfaceFactory {
    pub(crate) fn new(handles: Arc<HandleRegistry>) -> Self {
        Self { handles }
    }
}

impl SurfaceFactory for HeadlessSurfaceFactory {
    fn create(&self, surface_type: &str) -> Box<dyn PlaybackSurface> {
        Box::new(HeadlessSurface::new(surface_type, Arc::clone(&self.handles)))
    }
}
