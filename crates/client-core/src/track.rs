//! Exclusive ownership of local capture tracks
//!
//! The SDK hands out shared track objects, but the session controller is the
//! only party allowed to release them. [`LocalTrackHandle`] enforces that the
//! release happens exactly once, either explicitly on leave or when the
//! handle is dropped during teardown.

use tracing::debug;

use crate::sdk::LocalTrackRef;
use crate::types::MediaKind;

/// Owning wrapper around a local capture track
#[derive(Debug)]
pub struct LocalTrackHandle {
    track: LocalTrackRef,
    released: bool,
}

impl LocalTrackHandle {
    /// Take ownership of a freshly acquired track
    pub fn new(track: LocalTrackRef) -> Self {
        Self {
            track,
            released: false,
        }
    }

    /// SDK track id
    pub fn id(&self) -> &str {
        self.track.id()
    }

    /// Media kind
    pub fn kind(&self) -> MediaKind {
        self.track.kind()
    }

    /// Shared reference for publishing or configuration
    pub fn track(&self) -> &LocalTrackRef {
        &self.track
    }

    /// Whether the track has been released
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Close the underlying track; later calls do nothing
    ///
    /// Returns `true` if this call performed the release.
    pub fn release(&mut self) -> bool {
        if self.released {
            return false;
        }
        self.released = true;
        self.track.close();
        debug!("Released local {} track {}", self.track.kind(), self.track.id());
        true
    }
}

impl Drop for LocalTrackHandle {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::LoopbackTrack;
    use crate::sdk::LocalTrack;
    use std::sync::Arc;

    #[test]
    fn release_closes_once_even_when_dropped_afterwards() {
        let track = Arc::new(LoopbackTrack::new(MediaKind::Audio));
        let mut handle = LocalTrackHandle::new(track.clone());

        assert!(handle.release());
        assert!(!handle.release());
        drop(handle);

        assert_eq!(track.close_count(), 1);
    }

    #[test]
    fn dropping_an_unreleased_handle_closes_the_track() {
        let track = Arc::new(LoopbackTrack::new(MediaKind::Video));
        {
            let handle = LocalTrackHandle::new(track.clone());
            assert_eq!(handle.kind(), MediaKind::Video);
        }
        assert!(track.is_closed());
        assert_eq!(track.close_count(), 1);
    }
}
