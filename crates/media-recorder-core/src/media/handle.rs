use std::{collections::HashMap, fmt, sync::Arc};

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Opaque, locally resolvable address of a stream or a finalized recording.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaHandle(String);

impl MediaHandle {
    /// Wraps an existing address, e.g. content the host already stores.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finalized, playable media data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    mime_type: String,
    data: Arc<[u8]>,
}

impl Blob {
    /// Creates a blob from encoded bytes.
    pub fn new(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// MIME type of the encoded data.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Encoded bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the blob holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// What a handle resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleTarget {
    /// A live device track.
    Stream {
        /// Identifier of the live track.
        track_id: String,
    },
    /// A finalized recording.
    Recording(Blob),
}

/// Registry of live handles, the equivalent of an object URL store.
///
/// Device providers and encoders register handles here; track sessions
/// revoke the handles they own. A revoked handle never resolves again.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    entries: RwLock<HashMap<MediaHandle, HandleTarget>>,
}

impl HandleRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a target under a fresh `blob:` address.
    pub fn register(&self, target: HandleTarget) -> MediaHandle {
        let handle = MediaHandle(format!("blob:{}", Uuid::new_v4()));
        self.entries.write().insert(handle.clone(), target);

        debug!(handle = %handle, "Handle registered");

        handle
    }

    /// Looks up a handle, `None` once revoked or if it was never registered.
    pub fn resolve(&self, handle: &MediaHandle) -> Option<HandleTarget> {
        self.entries.read().get(handle).cloned()
    }

    /// Frees a handle. Returns whether it was live.
    pub fn revoke(&self, handle: &MediaHandle) -> bool {
        let removed = self.entries.write().remove(handle).is_some();

        if removed {
            debug!(handle = %handle, "Handle revoked");
        }

        removed
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether no handle is live.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
