//! Remote participant bookkeeping driven by SDK notifications

use std::sync::Arc;

use vcall_client_core::loopback::{FailPoint, LoopbackEngine, SdkCall};
use vcall_client_core::{
    ClientEvent, ControllerConfig, JoinOptions, MediaKind, Operation, RemoteEvent, RemoteUser,
    SessionController, Uid,
};

async fn joined(engine: &LoopbackEngine) -> SessionController {
    let mut controller = SessionController::new(Arc::new(engine.clone()), ControllerConfig::new());
    controller
        .join(JoinOptions::new("test-app", "lobby").with_uid(1u32))
        .await
        .expect("join should succeed");
    controller
}

#[tokio::test]
async fn published_video_keeps_participant_listed() {
    let engine = LoopbackEngine::new();
    let mut controller = joined(&engine).await;

    assert!(engine.publish_remote(42u32, MediaKind::Video));
    assert_eq!(controller.process_pending().await, 1);

    let participant = controller.remote_users().get(&Uid::from(42u32)).unwrap();
    assert!(participant.video_track.is_some());
    assert!(participant.audio_track.is_none());
    assert_eq!(
        engine.count_calls(|c| *c == SdkCall::Subscribe { uid: Uid::from(42u32), kind: MediaKind::Video }),
        1
    );
}

#[tokio::test]
async fn video_unpublish_removes_participant_entirely() {
    let engine = LoopbackEngine::new();
    let mut controller = joined(&engine).await;

    engine.publish_remote(42u32, MediaKind::Audio);
    engine.publish_remote(42u32, MediaKind::Video);
    engine.unpublish_remote(42u32, MediaKind::Video);
    assert_eq!(controller.process_pending().await, 3);

    assert!(!controller.remote_users().contains(&Uid::from(42u32)));
    assert!(controller.remote_users().is_empty());
}

// Audio unpublish clears the track but not the entry: video presence is the
// only "participant visible" signal, so an audio-only participant stays
// listed until the session ends.
#[tokio::test]
async fn audio_unpublish_alone_keeps_participant() {
    let engine = LoopbackEngine::new();
    let mut controller = joined(&engine).await;

    engine.publish_remote(9u32, MediaKind::Audio);
    engine.unpublish_remote(9u32, MediaKind::Audio);
    controller.process_pending().await;

    let participant = controller.remote_users().get(&Uid::from(9u32)).unwrap();
    assert!(participant.audio_track.is_none());
    assert!(participant.video_track.is_none());
}

#[tokio::test]
async fn audio_unpublish_drops_the_audio_track_from_the_view() {
    let engine = LoopbackEngine::new();
    let mut controller = joined(&engine).await;

    engine.publish_remote(8u32, MediaKind::Audio);
    engine.publish_remote(8u32, MediaKind::Video);
    engine.unpublish_remote(8u32, MediaKind::Audio);
    controller.process_pending().await;

    let view = controller.view();
    assert_eq!(view.remote.len(), 1);
    assert!(view.remote[0].audio.is_none());
    assert!(view.remote[0].video.is_some());
}

#[tokio::test]
async fn video_toggle_restores_the_still_subscribed_audio() {
    let engine = LoopbackEngine::new();
    let mut controller = joined(&engine).await;

    engine.publish_remote(12u32, MediaKind::Audio);
    engine.publish_remote(12u32, MediaKind::Video);
    engine.unpublish_remote(12u32, MediaKind::Video);
    engine.publish_remote(12u32, MediaKind::Video);
    assert_eq!(controller.process_pending().await, 4);

    let participant = controller.remote_users().get(&Uid::from(12u32)).unwrap();
    assert!(participant.audio_track.is_some());
    assert!(participant.video_track.is_some());
    // Audio was never unpublished, so it is not subscribed a second time
    assert_eq!(
        engine.count_calls(|c| *c == SdkCall::Subscribe { uid: Uid::from(12u32), kind: MediaKind::Audio }),
        1
    );
}

#[tokio::test]
async fn string_uids_render_in_arrival_order_after_numeric_uids() {
    let engine = LoopbackEngine::new();
    let mut controller = joined(&engine).await;
    engine.publish_remote("zoe", MediaKind::Video);
    engine.publish_remote("adam", MediaKind::Video);
    engine.publish_remote(50u32, MediaKind::Video);
    controller.process_pending().await;

    let labels: Vec<_> = controller.view().remote.iter().map(|t| t.label.clone().unwrap()).collect();
    assert_eq!(labels, vec!["uid: 50", "uid: zoe", "uid: adam"]);
}

#[tokio::test]
async fn participant_appears_only_after_subscription_resolves() {
    let engine = LoopbackEngine::new();
    engine.fail_on(FailPoint::Subscribe);
    let mut controller = joined(&engine).await;
    let mut events = controller.subscribe_events();

    engine.publish_remote(3u32, MediaKind::Video);
    let event = controller.next_event().await.unwrap();
    let err = controller.handle_event(event).await.unwrap_err();

    assert_eq!(err.operation(), Some(Operation::Subscribe));
    assert!(controller.remote_users().is_empty());
    assert!(controller.view().remote.is_empty());
    let mut saw_error_notice = false;
    while let Ok(event) = events.try_recv() {
        match event {
            ClientEvent::Notice(notice) => saw_error_notice |= notice.is_error(),
            ClientEvent::RemoteUsersChanged { .. } => panic!("participant must not become visible"),
            _ => {}
        }
    }
    assert!(saw_error_notice);
}

#[tokio::test]
async fn events_are_handled_in_arrival_order() {
    let engine = LoopbackEngine::new();
    let mut controller = joined(&engine).await;

    // Unpublish before publish leaves the participant listed
    engine.unpublish_remote(5u32, MediaKind::Video);
    engine.publish_remote(5u32, MediaKind::Video);
    // Publish before unpublish removes it
    engine.publish_remote(6u32, MediaKind::Video);
    engine.unpublish_remote(6u32, MediaKind::Video);
    controller.process_pending().await;

    assert!(controller.remote_users().contains(&Uid::from(5u32)));
    assert!(!controller.remote_users().contains(&Uid::from(6u32)));
}

#[tokio::test]
async fn leave_clears_remote_participants_and_stops_delivery() {
    let engine = LoopbackEngine::new();
    let mut controller = joined(&engine).await;
    engine.publish_remote(11u32, MediaKind::Video);
    controller.process_pending().await;
    assert_eq!(controller.remote_users().len(), 1);

    controller.leave().await.unwrap();

    assert!(controller.remote_users().is_empty());
    assert!(!engine.publish_remote(12u32, MediaKind::Video));
    assert_eq!(controller.process_pending().await, 0);
    assert!(controller.next_event().await.is_none());
}

#[tokio::test]
async fn view_lists_local_and_labelled_remote_tiles() {
    let engine = LoopbackEngine::new();
    let mut controller = joined(&engine).await;
    engine.publish_remote("carol", MediaKind::Video);
    engine.publish_remote(20u32, MediaKind::Video);
    engine.publish_remote(20u32, MediaKind::Audio);
    controller.process_pending().await;

    let view = controller.view();

    assert!(view.joined);
    assert_eq!(view.local_uid, Some(Uid::from(1u32)));
    let local = view.local.as_ref().unwrap();
    assert!(local.audio.is_some() && local.video.is_some());
    let labels: Vec<_> = view.remote.iter().map(|t| t.label.clone().unwrap()).collect();
    assert_eq!(labels, vec!["uid: 20", "uid: carol"]);
    assert!(view.remote[0].audio.is_some());
    assert!(view.remote[1].audio.is_none());
}

#[tokio::test]
async fn events_for_unpublished_kinds_are_rejected_by_the_sdk() {
    let engine = LoopbackEngine::new();
    let mut controller = joined(&engine).await;

    let user = RemoteUser::new(8u32).publishing(MediaKind::Audio);
    let result = controller
        .handle_event(RemoteEvent::UserPublished { user, kind: MediaKind::Video })
        .await;

    assert!(result.is_err());
    assert!(controller.remote_users().is_empty());
}
