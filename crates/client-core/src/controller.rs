//! Session controller: the join/leave lifecycle
//!
//! The controller owns everything one page-worth of call needs: the RTC
//! client for the current session, the local capture tracks, the codec for
//! the next join and the remote participant map. Nothing is process-global;
//! two controllers are two independent sessions.
//!
//! # Lifecycle
//!
//! ```text
//!            join() ok
//!   ┌──────┐ ─────────▶ ┌────────┐
//!   │ Idle │            │ Joined │
//!   └──────┘ ◀───────── └────────┘
//!            leave()
//! ```
//!
//! A failed join leaves the state `Idle` but keeps whatever it already set
//! up (client, tracks, uid); `leave()` cleans that up. There is no retry,
//! backoff or reconnection.
//!
//! # Usage Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use vcall_client_core::{ControllerConfig, JoinOptions, MediaKind, SessionController, SessionState};
//! use vcall_client_core::loopback::LoopbackEngine;
//!
//! # tokio_test::block_on(async {
//! let engine = LoopbackEngine::new();
//! let mut controller = SessionController::new(Arc::new(engine.clone()), ControllerConfig::new());
//!
//! controller.init_tracks().await.unwrap();
//! let uid = controller.join(JoinOptions::new("app-id", "lobby")).await.unwrap();
//! assert_eq!(controller.state(), SessionState::Joined);
//!
//! engine.publish_remote(1001u32, MediaKind::Video);
//! controller.process_pending().await;
//! assert_eq!(controller.remote_users().len(), 1);
//!
//! controller.leave().await.unwrap();
//! assert_eq!(controller.state(), SessionState::Idle);
//! # let _ = uid;
//! # })
//! ```

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::config::{ControllerConfig, JoinOptions};
use crate::error::{ClientError, ClientResult, Operation};
use crate::events::{ClientEvent, Notice, RemoteEvent};
use crate::remote::{RemoteUsers, Unpublished};
use crate::sdk::{LocalTrackRef, RemoteUser, RtcClient, RtcEngine};
use crate::track::LocalTrackHandle;
use crate::types::{EncoderProfile, MediaKind, SessionState, Uid, VideoCodec};
use crate::view::{SessionView, TrackTile};

/// Capacity of the client event broadcast channel
const CLIENT_EVENT_CAPACITY: usize = 256;

/// Text of the notice shown after a successful leave
pub const LEAVE_SUCCESS_MESSAGE: &str = "client leaves channel success!";

/// Coordinates local media, channel membership and remote participants
pub struct SessionController {
    engine: Arc<dyn RtcEngine>,
    config: ControllerConfig,
    state: SessionState,
    client: Option<Box<dyn RtcClient>>,
    local_uid: Option<Uid>,
    audio_track: Option<LocalTrackHandle>,
    video_track: Option<LocalTrackHandle>,
    remote_users: RemoteUsers,
    remote_rx: Option<mpsc::UnboundedReceiver<RemoteEvent>>,
    event_tx: broadcast::Sender<ClientEvent>,
}

impl SessionController {
    /// Create an idle controller on top of an SDK engine
    pub fn new(engine: Arc<dyn RtcEngine>, config: ControllerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(CLIENT_EVENT_CAPACITY);
        Self {
            engine,
            config,
            state: SessionState::Idle,
            client: None,
            local_uid: None,
            audio_track: None,
            video_track: None,
            remote_users: RemoteUsers::new(),
            remote_rx: None,
            event_tx,
        }
    }

    // ===== QUERIES =====

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_joined(&self) -> bool {
        self.state == SessionState::Joined
    }

    /// Uid assigned by the last join that got that far
    pub fn local_uid(&self) -> Option<&Uid> {
        self.local_uid.as_ref()
    }

    /// Codec the next join will use
    pub fn codec(&self) -> VideoCodec {
        self.config.codec
    }

    pub fn audio_track(&self) -> Option<&LocalTrackHandle> {
        self.audio_track.as_ref()
    }

    pub fn video_track(&self) -> Option<&LocalTrackHandle> {
        self.video_track.as_ref()
    }

    pub fn remote_users(&self) -> &RemoteUsers {
        &self.remote_users
    }

    /// Subscribe to state changes, participant changes and notices
    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.event_tx.subscribe()
    }

    /// Snapshot for the presentation layer
    pub fn view(&self) -> SessionView {
        let joined = self.is_joined();
        SessionView {
            joined,
            local_uid: self.local_uid.clone(),
            local: joined.then(|| TrackTile::local(self.audio_track.as_ref(), self.video_track.as_ref())),
            remote: self.remote_users.iter().map(TrackTile::remote).collect(),
        }
    }

    // ===== LOCAL MEDIA =====

    /// Acquire the microphone and camera, replacing any tracks already held
    ///
    /// Both devices are opened concurrently. If either fails, neither is
    /// kept and the one that did open is released.
    pub async fn init_tracks(&mut self) -> ClientResult<()> {
        let result = self.acquire_tracks().await;
        self.report(result)
    }

    async fn acquire_tracks(&mut self) -> ClientResult<()> {
        let (audio, video) = futures::join!(
            self.engine.create_microphone_audio_track(&self.config.audio),
            self.engine.create_camera_video_track(&self.config.video),
        );
        // Wrap before checking so a half-successful acquisition is released on drop
        let (audio, video) = match (audio.map(LocalTrackHandle::new), video.map(LocalTrackHandle::new)) {
            (Ok(audio), Ok(video)) => (audio, video),
            (Err(e), _) | (_, Err(e)) => return Err(ClientError::sdk(Operation::AcquireTracks, e)),
        };

        self.release_local_tracks();
        info!("Acquired local tracks audio={} video={}", audio.id(), video.id());
        self.audio_track = Some(audio);
        self.video_track = Some(video);
        Ok(())
    }

    /// Change the codec used by the next join; the current session is unaffected
    pub fn set_codec(&mut self, codec: VideoCodec) {
        debug!("Codec for next join: {} -> {}", self.config.codec, codec);
        self.config.codec = codec;
    }

    /// Apply an encoder preset to the live local video track
    pub async fn set_encoder_profile(&mut self, profile: EncoderProfile) -> ClientResult<()> {
        let track = self
            .video_track
            .as_ref()
            .ok_or(ClientError::NoLocalVideoTrack)?
            .track()
            .clone();
        track
            .set_encoder_configuration(profile)
            .await
            .map_err(|e| ClientError::sdk(Operation::SetEncoderProfile, e))?;
        self.config.video.encoder_profile = profile;
        info!("Applied encoder profile {} to track {}", profile, track.id());
        Ok(())
    }

    // ===== JOIN / LEAVE =====

    /// Join a channel and publish the local tracks
    ///
    /// Any failure is logged, reported as an error notice and returned; the
    /// session state is left as it was.
    pub async fn join(&mut self, options: JoinOptions) -> ClientResult<Uid> {
        let result = self.try_join(&options).await;
        self.report(result)
    }

    async fn try_join(&mut self, options: &JoinOptions) -> ClientResult<Uid> {
        if self.is_joined() {
            return Err(ClientError::invalid_state("already joined a channel"));
        }
        options.validate()?;

        let client_config = crate::config::ClientConfig::new()
            .with_mode(self.config.mode)
            .with_codec(self.config.codec);
        let mut client = self.engine.create_client(client_config);
        let (remote_tx, remote_rx) = mpsc::unbounded_channel();
        client.on_event(remote_tx);
        if self.client.replace(client).is_some() {
            warn!("Discarding client left over from an earlier join attempt");
        }
        self.remote_rx = Some(remote_rx);
        info!(
            "Created {} client with codec {} for channel {}",
            client_config.mode, client_config.codec, options.channel
        );

        if self.audio_track.is_none() && self.video_track.is_none() {
            self.acquire_tracks().await?;
        }

        let uid = self
            .client_mut()?
            .join(&options.app_id, &options.channel, options.token(), options.uid())
            .await
            .map_err(|e| ClientError::sdk(Operation::Join, e))?;
        self.local_uid = Some(uid.clone());
        info!("Joined channel {} as uid {}", options.channel, uid);

        let tracks = self.local_track_refs();
        self.client_mut()?
            .publish(&tracks)
            .await
            .map_err(|e| ClientError::sdk(Operation::Publish, e))?;
        debug!("Published {} local track(s)", tracks.len());

        self.notify(Notice::success(format!(
            "join channel: {} success, uid: {}",
            options.channel, uid
        )));
        self.set_state(SessionState::Joined);
        Ok(uid)
    }

    /// Release local tracks, forget remote participants and leave the channel
    ///
    /// Safe in any state. A second consecutive call makes no SDK calls and
    /// emits nothing. An error from the SDK's leave is returned as-is and
    /// not reported as a notice; the client is kept and the state stays put
    /// until a later call gets the SDK to leave.
    pub async fn leave(&mut self) -> ClientResult<()> {
        let released = self.release_local_tracks();
        let had_remote = !self.remote_users.is_empty();
        self.remote_users.clear();
        self.remote_rx = None;
        if had_remote {
            self.emit(ClientEvent::RemoteUsersChanged { count: 0 });
        }

        if self.client.is_none() && released == 0 && !self.is_joined() {
            debug!("Leave requested with nothing to release");
            return Ok(());
        }

        if let Some(mut client) = self.client.take() {
            if let Err(e) = client.leave().await {
                // Keep the client so the next leave() asks the SDK again
                self.client = Some(client);
                return Err(ClientError::sdk(Operation::Leave, e));
            }
            info!("Client left the channel");
        }

        self.local_uid = None;
        self.set_state(SessionState::Idle);
        self.notify(Notice::success(LEAVE_SUCCESS_MESSAGE));
        Ok(())
    }

    /// Teardown: leave if joined, otherwise just release local tracks
    pub async fn shutdown(&mut self) -> ClientResult<()> {
        if self.is_joined() {
            return self.leave().await;
        }
        let released = self.release_local_tracks();
        debug!("Shutdown released {} idle track(s)", released);
        Ok(())
    }

    // ===== REMOTE EVENTS =====

    /// Wait for the next SDK notification for the current client
    ///
    /// Returns `None` when there is no client or the client went away.
    pub async fn next_event(&mut self) -> Option<RemoteEvent> {
        self.remote_rx.as_mut()?.recv().await
    }

    /// Handle every notification already queued, in arrival order
    ///
    /// Returns the number of events handled.
    pub async fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let next = match self.remote_rx.as_mut() {
                Some(rx) => rx.try_recv().ok(),
                None => None,
            };
            let Some(event) = next else { break };
            // Failures were already reported as notices
            let _ = self.handle_event(event).await;
            handled += 1;
        }
        handled
    }

    /// Dispatch one SDK notification
    pub async fn handle_event(&mut self, event: RemoteEvent) -> ClientResult<()> {
        match event {
            RemoteEvent::UserPublished { user, kind } => self.handle_user_published(user, kind).await,
            RemoteEvent::UserUnpublished { user, kind } => {
                self.handle_user_unpublished(&user, kind);
                Ok(())
            }
        }
    }

    /// Subscribe to a participant's media, then make it visible
    ///
    /// The participant is only added once the subscription has resolved, so
    /// the view never shows a track that is not ready.
    pub async fn handle_user_published(&mut self, user: RemoteUser, kind: MediaKind) -> ClientResult<()> {
        let result = self.subscribe_remote(user, kind).await;
        self.report(result)
    }

    async fn subscribe_remote(&mut self, user: RemoteUser, kind: MediaKind) -> ClientResult<()> {
        let track = self
            .client_mut()?
            .subscribe(&user, kind)
            .await
            .map_err(|e| ClientError::sdk(Operation::Subscribe, e))?;
        debug!("Subscribed to {} of uid {} ({})", kind, user.uid, track.id());
        self.remote_users.merge(user.uid, track);
        self.emit(ClientEvent::RemoteUsersChanged {
            count: self.remote_users.len(),
        });
        Ok(())
    }

    /// Forget an unpublished track
    ///
    /// Video unpublish hides the participant. Audio unpublish only clears
    /// the audio track, so audio-only participants stay listed until they
    /// unpublish video or the session ends.
    pub fn handle_user_unpublished(&mut self, user: &RemoteUser, kind: MediaKind) {
        match self.remote_users.unpublish(&user.uid, kind) {
            Unpublished::Removed => {
                info!("Remote uid {} removed", user.uid);
                self.emit(ClientEvent::RemoteUsersChanged {
                    count: self.remote_users.len(),
                });
            }
            Unpublished::TrackCleared => {
                debug!("Cleared {} track of uid {}; participant stays listed", kind, user.uid);
            }
            Unpublished::Unknown => {
                debug!("Ignoring {} unpublish from unknown uid {}", kind, user.uid);
            }
        }
    }

    // ===== INTERNALS =====

    fn client_mut(&mut self) -> ClientResult<&mut Box<dyn RtcClient>> {
        self.client
            .as_mut()
            .ok_or_else(|| ClientError::invalid_state("no RTC client; join first"))
    }

    fn local_track_refs(&self) -> Vec<LocalTrackRef> {
        [self.audio_track.as_ref(), self.video_track.as_ref()]
            .into_iter()
            .flatten()
            .map(|handle| handle.track().clone())
            .collect()
    }

    /// Release and forget both local tracks; returns how many were released
    fn release_local_tracks(&mut self) -> usize {
        [self.audio_track.take(), self.video_track.take()]
            .into_iter()
            .flatten()
            .filter_map(|mut handle| handle.release().then_some(()))
            .count()
    }

    fn set_state(&mut self, current: SessionState) {
        let previous = self.state;
        if previous == current {
            return;
        }
        self.state = current;
        info!("Session state {:?} -> {:?}", previous, current);
        self.emit(ClientEvent::StateChanged { previous, current });
    }

    /// Log and surface a failure as an error notice, then pass the result on
    fn report<T>(&self, result: ClientResult<T>) -> ClientResult<T> {
        if let Err(err) = &result {
            match err.operation() {
                Some(op) => error!("Operation {} failed: {}", op, err),
                None => error!("Operation failed: {}", err),
            }
            self.notify(Notice::error(err.to_string()));
        }
        result
    }

    fn notify(&self, notice: Notice) {
        self.emit(ClientEvent::Notice(notice));
    }

    fn emit(&self, event: ClientEvent) {
        // No receivers is fine; the presentation layer may not be listening
        let _ = self.event_tx.send(event);
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.is_joined() {
            warn!("Session controller dropped while joined; call shutdown() first");
        }
    }
}
