//! `vcall`: join a channel, publish camera and microphone, render participants
//!
//! The demo runs against the in-process loopback engine, so remote
//! participants are simulated: each one publishes video and audio, then the
//! first one turns its camera off and the last one mutes.

mod args;
mod terminal;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vcall_client_core::loopback::LoopbackEngine;
use vcall_client_core::{ClientEvent, ControllerConfig, MediaKind, SessionController};

use crate::args::Cli;
use crate::terminal::{show_notice, TerminalRenderer};

/// First uid handed to simulated participants
const FIRST_PEER_UID: u32 = 2000;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("vcall=info,vcall_client_core=info")),
        )
        .init();

    let settings = Cli::parse().resolve()?;
    info!("Starting vcall {} with codec {}", vcall_client_core::VERSION, settings.codec);

    let engine = LoopbackEngine::new().with_latency(settings.latency);
    let mut controller = SessionController::new(
        Arc::new(engine.clone()),
        ControllerConfig::new().with_codec(settings.codec),
    );

    let mut events = controller.subscribe_events();

    // Open devices up front so the preview is ready before joining
    if controller.init_tracks().await.is_err() {
        warn!("Local tracks unavailable; join will try again");
    }
    show_pending_notices(&mut events);

    let mut renderer = TerminalRenderer::new();
    let outcome = run_session(&mut controller, &engine, &settings, &mut renderer, &mut events).await;

    let shutdown = controller.shutdown().await;
    show_pending_notices(&mut events);
    shutdown?;
    outcome
}

/// Print notices queued so far, keeping them in step with rendered output
fn show_pending_notices(events: &mut broadcast::Receiver<ClientEvent>) {
    loop {
        match events.try_recv() {
            Ok(ClientEvent::Notice(notice)) => show_notice(&notice),
            Ok(_) => {}
            Err(TryRecvError::Lagged(skipped)) => warn!("Missed {} client events", skipped),
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

async fn run_session(
    controller: &mut SessionController,
    engine: &LoopbackEngine,
    settings: &args::Settings,
    renderer: &mut TerminalRenderer,
    events: &mut broadcast::Receiver<ClientEvent>,
) -> Result<()> {
    let joined = controller.join(settings.join.clone()).await;
    show_pending_notices(events);
    joined?;

    if let Some(profile) = settings.profile {
        if let Err(e) = controller.set_encoder_profile(profile).await {
            warn!("Could not apply encoder profile {}: {}", profile, e);
        }
    }

    let peers: Vec<u32> = (0..settings.peers).map(|i| FIRST_PEER_UID + i).collect();
    for &uid in &peers {
        engine.publish_remote(uid, MediaKind::Video);
        engine.publish_remote(uid, MediaKind::Audio);
    }
    controller.process_pending().await;
    show_pending_notices(events);
    controller.view().render(renderer);
    renderer.flush();

    if let (Some(&first), Some(&last)) = (peers.first(), peers.last()) {
        engine.unpublish_remote(first, MediaKind::Video);
        if last != first {
            engine.unpublish_remote(last, MediaKind::Audio);
        }
        controller.process_pending().await;
        show_pending_notices(events);
        controller.view().render(renderer);
        renderer.flush();
    }

    let left = controller.leave().await;
    show_pending_notices(events);
    left?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcall_client_core::Notice;

    #[test]
    fn pending_notices_are_drained_before_rendering() {
        let (tx, mut rx) = broadcast::channel(8);
        tx.send(ClientEvent::Notice(Notice::success("join channel: lobby success, uid: 1")))
            .unwrap();
        tx.send(ClientEvent::RemoteUsersChanged { count: 2 }).unwrap();

        show_pending_notices(&mut rx);

        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }
}
