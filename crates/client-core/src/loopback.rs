//! In-process RTC engine
//!
//! `LoopbackEngine` implements the SDK contract without any network: joins
//! succeed immediately with a server-style uid, publishes and subscriptions
//! are recorded, and remote participants are simulated by injecting
//! notifications. It backs the command-line demo and doubles as the test
//! engine, with failure injection for every SDK call.
//!
//! # Examples
//!
//! ```rust
//! use vcall_client_core::loopback::{FailPoint, LoopbackEngine};
//!
//! let engine = LoopbackEngine::new();
//! engine.fail_on(FailPoint::Camera);
//! assert!(engine.is_failing(FailPoint::Camera));
//! engine.clear_failures();
//! assert!(!engine.is_failing(FailPoint::Camera));
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::config::{AudioTrackConfig, ClientConfig, VideoTrackConfig};
use crate::error::{RtcError, RtcResult};
use crate::events::RemoteEvent;
use crate::sdk::{LocalTrack, LocalTrackRef, RemoteTrack, RemoteTrackRef, RemoteUser, RtcClient, RtcEngine};
use crate::types::{EncoderProfile, MediaKind, Uid};

/// SDK call that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Microphone,
    Camera,
    Join,
    Publish,
    Subscribe,
    Leave,
    EncoderConfiguration,
}

/// Record of a call made into the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkCall {
    CreateClient(ClientConfig),
    CreateTrack(MediaKind),
    Join { channel: String, uid: Uid },
    Publish { track_ids: Vec<String> },
    Subscribe { uid: Uid, kind: MediaKind },
    Leave,
}

#[derive(Debug, Default)]
struct EngineState {
    calls: Mutex<Vec<SdkCall>>,
    failures: Mutex<HashSet<FailPoint>>,
    tracks: Mutex<Vec<Arc<LoopbackTrack>>>,
    sink: Mutex<Option<mpsc::UnboundedSender<RemoteEvent>>>,
    latency: Mutex<Duration>,
}

impl EngineState {
    fn record(&self, call: SdkCall) {
        trace!("loopback call: {:?}", call);
        self.calls.lock().push(call);
    }

    fn check(&self, point: FailPoint) -> RtcResult<()> {
        if !self.failures.lock().contains(&point) {
            return Ok(());
        }
        let err = match point {
            FailPoint::Microphone => RtcError::new("PERMISSION_DENIED", "microphone access was denied"),
            FailPoint::Camera => RtcError::new("PERMISSION_DENIED", "camera access was denied"),
            FailPoint::Join => RtcError::new("CAN_NOT_GET_GATEWAY_SERVER", "invalid vendor key, can not find appid"),
            FailPoint::Publish => RtcError::new("TRACK_IS_DISABLED", "can not publish a disabled track"),
            FailPoint::Subscribe => RtcError::new("INVALID_REMOTE_USER", "user is not in the channel"),
            FailPoint::Leave => RtcError::new("NETWORK_ERROR", "leave request timed out"),
            FailPoint::EncoderConfiguration => RtcError::new("NOT_SUPPORTED", "encoder configuration rejected"),
        };
        Err(err)
    }

    async fn pause(&self) {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

/// In-process engine with simulated remote participants
#[derive(Debug, Clone, Default)]
pub struct LoopbackEngine {
    state: Arc<EngineState>,
}

impl LoopbackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every asynchronous SDK call by `latency`
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.state.latency.lock() = latency;
        self
    }

    /// Make a call fail until cleared
    pub fn fail_on(&self, point: FailPoint) {
        self.state.failures.lock().insert(point);
    }

    /// Let a call succeed again
    pub fn clear_failure(&self, point: FailPoint) {
        self.state.failures.lock().remove(&point);
    }

    pub fn clear_failures(&self) {
        self.state.failures.lock().clear();
    }

    pub fn is_failing(&self, point: FailPoint) -> bool {
        self.state.failures.lock().contains(&point)
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<SdkCall> {
        self.state.calls.lock().clone()
    }

    /// Number of recorded calls matching `pred`
    pub fn count_calls(&self, pred: impl Fn(&SdkCall) -> bool) -> usize {
        self.state.calls.lock().iter().filter(|call| pred(call)).count()
    }

    /// Every local track created so far
    pub fn created_tracks(&self) -> Vec<Arc<LoopbackTrack>> {
        self.state.tracks.lock().clone()
    }

    /// Deliver a notification to the most recently registered client
    ///
    /// Returns `false` when no client is listening.
    pub fn emit(&self, event: RemoteEvent) -> bool {
        match self.state.sink.lock().as_ref() {
            Some(sink) => sink.send(event).is_ok(),
            None => false,
        }
    }

    /// Simulate a remote participant publishing a media kind
    pub fn publish_remote(&self, uid: impl Into<Uid>, kind: MediaKind) -> bool {
        let user = RemoteUser::new(uid).publishing(kind);
        self.emit(RemoteEvent::UserPublished { user, kind })
    }

    /// Simulate a remote participant unpublishing a media kind
    pub fn unpublish_remote(&self, uid: impl Into<Uid>, kind: MediaKind) -> bool {
        let user = RemoteUser::new(uid);
        self.emit(RemoteEvent::UserUnpublished { user, kind })
    }

    fn create_track(&self, kind: MediaKind) -> Arc<LoopbackTrack> {
        let track = Arc::new(LoopbackTrack::new(kind));
        self.state.tracks.lock().push(track.clone());
        self.state.record(SdkCall::CreateTrack(kind));
        track
    }
}

#[async_trait]
impl RtcEngine for LoopbackEngine {
    fn create_client(&self, config: ClientConfig) -> Box<dyn RtcClient> {
        self.state.record(SdkCall::CreateClient(config));
        Box::new(LoopbackClient {
            state: self.state.clone(),
            config,
            sink: None,
            local_uid: None,
        })
    }

    async fn create_microphone_audio_track(&self, config: &AudioTrackConfig) -> RtcResult<LocalTrackRef> {
        self.state.pause().await;
        self.state.check(FailPoint::Microphone)?;
        debug!("Opening microphone {:?}", config.device_id);
        Ok(self.create_track(MediaKind::Audio))
    }

    async fn create_camera_video_track(&self, config: &VideoTrackConfig) -> RtcResult<LocalTrackRef> {
        self.state.pause().await;
        self.state.check(FailPoint::Camera)?;
        debug!("Opening camera {:?} at {}", config.device_id, config.encoder_profile);
        let track = self.create_track(MediaKind::Video);
        *track.profile.lock() = Some(config.encoder_profile);
        Ok(track)
    }
}

/// Local track produced by the loopback engine
#[derive(Debug)]
pub struct LoopbackTrack {
    id: String,
    kind: MediaKind,
    closed: AtomicBool,
    close_count: AtomicUsize,
    profile: Mutex<Option<EncoderProfile>>,
}

impl LoopbackTrack {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            id: format!("track-{}", Uuid::new_v4().simple()),
            kind,
            closed: AtomicBool::new(false),
            close_count: AtomicUsize::new(0),
            profile: Mutex::new(None),
        }
    }

    /// How many times `close` was called
    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    /// Encoder preset currently applied
    pub fn encoder_profile(&self) -> Option<EncoderProfile> {
        *self.profile.lock()
    }
}

#[async_trait]
impl LocalTrack for LoopbackTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn close(&self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn set_encoder_configuration(&self, profile: EncoderProfile) -> RtcResult<()> {
        if self.kind != MediaKind::Video {
            return Err(RtcError::new("NOT_SUPPORTED", "audio tracks have no video encoder"));
        }
        if self.is_closed() {
            return Err(RtcError::new("TRACK_IS_DISABLED", "track is closed"));
        }
        *self.profile.lock() = Some(profile);
        Ok(())
    }
}

/// Remote track handed out by [`LoopbackClient::subscribe`]
#[derive(Debug, Clone)]
pub struct LoopbackRemoteTrack {
    id: String,
    kind: MediaKind,
    uid: Uid,
}

impl LoopbackRemoteTrack {
    pub fn new(uid: Uid, kind: MediaKind) -> Self {
        Self {
            id: format!("remote-{}-{}", uid, kind),
            kind,
            uid,
        }
    }
}

impl RemoteTrack for LoopbackRemoteTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn uid(&self) -> &Uid {
        &self.uid
    }
}

/// Client created by [`LoopbackEngine`]
pub struct LoopbackClient {
    state: Arc<EngineState>,
    config: ClientConfig,
    sink: Option<mpsc::UnboundedSender<RemoteEvent>>,
    local_uid: Option<Uid>,
}

impl LoopbackClient {
    fn require_joined(&self, action: &str) -> RtcResult<()> {
        if self.local_uid.is_none() {
            return Err(RtcError::new(
                "INVALID_OPERATION",
                format!("can not {}, client is not in the channel", action),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl RtcClient for LoopbackClient {
    fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn on_event(&mut self, sink: mpsc::UnboundedSender<RemoteEvent>) {
        *self.state.sink.lock() = Some(sink.clone());
        self.sink = Some(sink);
    }

    async fn join(
        &mut self,
        app_id: &str,
        channel: &str,
        _token: Option<&str>,
        uid: Option<&Uid>,
    ) -> RtcResult<Uid> {
        self.state.pause().await;
        if self.local_uid.is_some() {
            return Err(RtcError::new(
                "INVALID_OPERATION",
                "client already in connecting/connected state",
            ));
        }
        if app_id.is_empty() {
            return Err(RtcError::new("INVALID_PARAMS", "app id is empty"));
        }
        self.state.check(FailPoint::Join)?;

        let assigned = match uid {
            Some(uid) => uid.clone(),
            None => Uid::Number(rand::thread_rng().gen_range(100_000..1_000_000)),
        };
        self.state.record(SdkCall::Join {
            channel: channel.to_string(),
            uid: assigned.clone(),
        });
        self.local_uid = Some(assigned.clone());
        Ok(assigned)
    }

    async fn publish(&mut self, tracks: &[LocalTrackRef]) -> RtcResult<()> {
        self.state.pause().await;
        self.require_joined("publish")?;
        self.state.check(FailPoint::Publish)?;
        if let Some(closed) = tracks.iter().find(|t| t.is_closed()) {
            return Err(RtcError::new(
                "TRACK_IS_DISABLED",
                format!("can not publish closed track {}", closed.id()),
            ));
        }
        self.state.record(SdkCall::Publish {
            track_ids: tracks.iter().map(|t| t.id().to_string()).collect(),
        });
        Ok(())
    }

    async fn subscribe(&mut self, user: &RemoteUser, kind: MediaKind) -> RtcResult<RemoteTrackRef> {
        self.state.pause().await;
        self.require_joined("subscribe")?;
        self.state.check(FailPoint::Subscribe)?;
        let publishing = match kind {
            MediaKind::Audio => user.has_audio,
            MediaKind::Video => user.has_video,
        };
        if !publishing {
            return Err(RtcError::new(
                "REMOTE_USER_IS_NOT_PUBLISHED",
                format!("user {} is not publishing {}", user.uid, kind),
            ));
        }
        self.state.record(SdkCall::Subscribe {
            uid: user.uid.clone(),
            kind,
        });
        Ok(Arc::new(LoopbackRemoteTrack::new(user.uid.clone(), kind)))
    }

    async fn leave(&mut self) -> RtcResult<()> {
        self.state.pause().await;
        self.state.check(FailPoint::Leave)?;
        self.state.record(SdkCall::Leave);
        self.local_uid = None;
        if let Some(sink) = self.sink.take() {
            let mut shared = self.state.sink.lock();
            if shared.as_ref().is_some_and(|s| s.same_channel(&sink)) {
                *shared = None;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn join_assigns_a_uid_when_none_requested() {
        let engine = LoopbackEngine::new();
        let mut client = engine.create_client(ClientConfig::new());
        let uid = client.join("app", "room", None, None).await.unwrap();
        assert!(!uid.is_empty());
        assert!(matches!(uid, Uid::Number(n) if n >= 100_000));
    }

    #[tokio::test]
    async fn publish_requires_joining_first() {
        let engine = LoopbackEngine::new();
        let mut client = engine.create_client(ClientConfig::new());
        let track = engine
            .create_microphone_audio_track(&AudioTrackConfig::default())
            .await
            .unwrap();
        let err = client.publish(&[track]).await.unwrap_err();
        assert_eq!(err.code, "INVALID_OPERATION");
    }

    #[tokio::test]
    async fn emitted_events_reach_the_registered_sink() {
        let engine = LoopbackEngine::new();
        let mut client = engine.create_client(ClientConfig::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        client.on_event(tx);

        assert!(engine.publish_remote(7u32, MediaKind::Video));
        let event = rx.recv().await.unwrap();
        assert_eq!(event.uid(), &Uid::from(7u32));
        assert_eq!(event.kind(), MediaKind::Video);
    }

    #[tokio::test]
    async fn leave_detaches_the_event_sink() {
        let engine = LoopbackEngine::new();
        let mut client = engine.create_client(ClientConfig::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        client.on_event(tx);
        client.join("app", "room", None, Some(&Uid::from(1u32))).await.unwrap();
        client.leave().await.unwrap();

        assert!(!engine.publish_remote(2u32, MediaKind::Audio));
    }

    #[tokio::test]
    async fn camera_track_starts_with_the_configured_profile() {
        let engine = LoopbackEngine::new();
        let config = VideoTrackConfig {
            encoder_profile: EncoderProfile::P360_1,
            ..VideoTrackConfig::default()
        };
        engine.create_camera_video_track(&config).await.unwrap();

        let tracks = engine.created_tracks();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].encoder_profile(), Some(EncoderProfile::P360_1));
        assert_eq!(engine.calls(), vec![SdkCall::CreateTrack(MediaKind::Video)]);
    }

    #[tokio::test]
    async fn failure_injection_surfaces_sdk_errors() {
        let engine = LoopbackEngine::new();
        engine.fail_on(FailPoint::Camera);
        let err = engine
            .create_camera_video_track(&VideoTrackConfig::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, "PERMISSION_DENIED");
        assert!(engine.created_tracks().is_empty());
    }
}
