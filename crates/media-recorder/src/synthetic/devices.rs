use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use media_recorder_core::{
    CaptureConstraints, CapturedStream, DeviceError, DeviceProvider, HandleRegistry,
    HandleTarget, LiveTrack, MediaKind, VideoRequest,
};
use tracing::{info, instrument};

/// Grants a synthetic track for every request, or refuses every request
/// as if the user dismissed the permission prompt.
pub(crate) struct SyntheticDevices {
    handles: Arc<HandleRegistry>,
    denied: bool,
    next_track: AtomicU64,
}

impl SyntheticDevices {
    pub(crate) fn new(handles: Arc<HandleRegistry>, denied: bool) -> Self {
        Self {
            handles,
            denied,
            next_track: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl DeviceProvider for SyntheticDevices {
    #[instrument(skip(self))]
    async fn acquire(
        &self,
        kind: MediaKind,
        constraints: &CaptureConstraints,
    ) -> Result<CapturedStream, DeviceError> {
        if self.denied {
            return Err(DeviceError::PermissionDenied {
                reason: "access to synthetic devices is denied".to_string(),
            });
        }

        if !constraints.audio && constraints.video == VideoRequest::None {
            return Err(DeviceError::UnsupportedDevice {
                reason: "request names neither audio nor video".to_string(),
            });
        }

        let n = self.next_track.fetch_add(1, Ordering::Relaxed);
        let track_id = format!("synthetic-{kind}-{n}");
        let preview = self.handles.register(HandleTarget::Stream {
            track_id: track_id.clone(),
        });

        info!(track_id = %track_id, preview = %preview, "Synthetic device granted");

        Ok(CapturedStream {
            track: Box::new(SyntheticTrack {
                id: track_id,
                kind,
                live: true,
            }),
            preview,
        })
    }
}

struct SyntheticTrack {
    id: String,
    kind: MediaKind,
    live: bool,
}

impl LiveTrack for SyntheticTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            info!(track_id = %self.id, "Synthetic track stopped");
        }
    }
}
