//! Presentation snapshot of a session
//!
//! The controller does not draw anything. It produces a [`SessionView`]
//! that a presentation layer walks with a [`TrackRenderer`]: a "Local User"
//! section while joined, and a "Remote Users" section listing one tile per
//! participant labelled `uid: <id>`.

use crate::remote::RemoteParticipant;
use crate::track::LocalTrackHandle;
use crate::types::{MediaKind, Uid};

/// Identity of a renderable track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackSummary {
    pub id: String,
    pub kind: MediaKind,
}

/// One player tile: an optional video track, optional audio track, optional label
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackTile {
    pub label: Option<String>,
    pub video: Option<TrackSummary>,
    pub audio: Option<TrackSummary>,
}

impl TrackTile {
    pub(crate) fn local(audio: Option<&LocalTrackHandle>, video: Option<&LocalTrackHandle>) -> Self {
        let summary = |handle: &LocalTrackHandle| TrackSummary {
            id: handle.id().to_string(),
            kind: handle.kind(),
        };
        Self {
            label: None,
            video: video.map(summary),
            audio: audio.map(summary),
        }
    }

    pub(crate) fn remote(participant: &RemoteParticipant) -> Self {
        let summary = |kind: MediaKind| {
            participant.track(kind).map(|track| TrackSummary {
                id: track.id().to_string(),
                kind,
            })
        };
        Self {
            label: Some(participant.label()),
            video: summary(MediaKind::Video),
            audio: summary(MediaKind::Audio),
        }
    }
}

/// Everything the presentation layer needs to draw the call
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    pub joined: bool,
    pub local_uid: Option<Uid>,
    /// Present only while joined
    pub local: Option<TrackTile>,
    pub remote: Vec<TrackTile>,
}

/// Presentation layer callback
pub trait TrackRenderer {
    /// Start a titled section
    fn section(&mut self, title: &str);

    /// A free-standing line of text
    fn line(&mut self, text: &str);

    /// Draw a player tile
    fn tile(&mut self, tile: &TrackTile);
}

impl SessionView {
    /// Walk the view in display order
    pub fn render(&self, renderer: &mut dyn TrackRenderer) {
        if let (true, Some(local)) = (self.joined, &self.local) {
            renderer.section("Local User");
            if let Some(uid) = &self.local_uid {
                renderer.line(&format!("uid: {}", uid));
            }
            renderer.tile(local);
        }
        if !self.remote.is_empty() {
            renderer.section("Remote Users");
            for tile in &self.remote {
                renderer.tile(tile);
            }
        }
    }
}
