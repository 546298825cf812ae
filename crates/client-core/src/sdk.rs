//! Capability contract for the external RTC SDK
//!
//! Everything that touches the network or the media pipeline lives behind
//! these traits: signaling, transport, congestion control and encoding are
//! the SDK's business. The session controller only orchestrates calls into
//! them, which also lets tests substitute [`crate::loopback::LoopbackEngine`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   create_client    ┌──────────────────┐
//! │  SessionController   │ ─────────────────▶ │    RtcEngine     │
//! │                      │   create_*_track   │                  │
//! │   mpsc::Receiver  ◀──┼──── RemoteEvent ───┤ ┌──────────────┐ │
//! │                      │ join/publish/...   │ │  RtcClient   │ │
//! │                      │ ─────────────────▶ │ └──────────────┘ │
//! └──────────────────────┘                    └──────────────────┘
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::{AudioTrackConfig, ClientConfig, VideoTrackConfig};
use crate::error::RtcResult;
use crate::events::RemoteEvent;
use crate::types::{EncoderProfile, MediaKind, Uid};

/// Shared handle to a local capture track
pub type LocalTrackRef = Arc<dyn LocalTrack>;

/// Shared handle to a subscribed remote track (owned by the SDK client)
pub type RemoteTrackRef = Arc<dyn RemoteTrack>;

/// A local capture resource produced by the SDK
///
/// Closing releases the underlying device. The controller guarantees it
/// closes each track it owns exactly once; see [`crate::track::LocalTrackHandle`].
#[async_trait]
pub trait LocalTrack: Send + Sync + fmt::Debug {
    /// SDK-assigned track id
    fn id(&self) -> &str;

    /// Media kind captured by this track
    fn kind(&self) -> MediaKind;

    /// Stop capture and release the device
    fn close(&self);

    /// Whether `close` has been called
    fn is_closed(&self) -> bool;

    /// Apply an encoder preset while the track is live (video tracks only)
    async fn set_encoder_configuration(&self, profile: EncoderProfile) -> RtcResult<()>;
}

/// A remote participant's track after subscription
pub trait RemoteTrack: Send + Sync + fmt::Debug {
    /// SDK-assigned track id
    fn id(&self) -> &str;

    /// Media kind of the track
    fn kind(&self) -> MediaKind;

    /// Participant that published the track
    fn uid(&self) -> &Uid;
}

/// A remote participant as described in SDK notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    /// Server-assigned participant id
    pub uid: Uid,
    /// Whether the participant currently publishes audio
    pub has_audio: bool,
    /// Whether the participant currently publishes video
    pub has_video: bool,
}

impl RemoteUser {
    /// Describe a participant with no published media
    pub fn new(uid: impl Into<Uid>) -> Self {
        Self {
            uid: uid.into(),
            has_audio: false,
            has_video: false,
        }
    }

    /// Mark a media kind as published
    pub fn publishing(mut self, kind: MediaKind) -> Self {
        match kind {
            MediaKind::Audio => self.has_audio = true,
            MediaKind::Video => self.has_video = true,
        }
        self
    }
}

/// One RTC client instance: a single channel membership
#[async_trait]
pub trait RtcClient: Send + Sync {
    /// Configuration the client was created with
    fn config(&self) -> &ClientConfig;

    /// Register the sink for "user-published" / "user-unpublished" notifications
    ///
    /// Registering again replaces the previous sink.
    fn on_event(&mut self, sink: mpsc::UnboundedSender<RemoteEvent>);

    /// Join a channel, returning the uid the server assigned
    async fn join(
        &mut self,
        app_id: &str,
        channel: &str,
        token: Option<&str>,
        uid: Option<&Uid>,
    ) -> RtcResult<Uid>;

    /// Publish local tracks to the channel
    async fn publish(&mut self, tracks: &[LocalTrackRef]) -> RtcResult<()>;

    /// Subscribe to one media kind of a remote participant
    async fn subscribe(&mut self, user: &RemoteUser, kind: MediaKind) -> RtcResult<RemoteTrackRef>;

    /// Leave the channel
    async fn leave(&mut self) -> RtcResult<()>;
}

/// Entry point of the SDK: client construction and local media acquisition
#[async_trait]
pub trait RtcEngine: Send + Sync {
    /// Construct a new client
    fn create_client(&self, config: ClientConfig) -> Box<dyn RtcClient>;

    /// Open the microphone
    async fn create_microphone_audio_track(&self, config: &AudioTrackConfig) -> RtcResult<LocalTrackRef>;

    /// Open the camera
    async fn create_camera_video_track(&self, config: &VideoTrackConfig) -> RtcResult<LocalTrackRef>;
}
