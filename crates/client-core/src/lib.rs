//! # vcall-client-core
//!
//! Session glue for joining a real-time audio/video channel through an
//! external RTC SDK. The SDK does the hard parts (signaling, transport,
//! congestion control, encoding); this crate acquires local camera and
//! microphone tracks, joins and leaves channels, publishes local media,
//! subscribes to remote participants and keeps a renderable view of who is
//! in the call.
//!
//! ## Architecture
//!
//! - [`sdk`]: the capability contract any RTC SDK binding must satisfy
//! - [`controller`]: the [`SessionController`] state machine (`Idle` / `Joined`)
//! - [`events`]: SDK notifications in, client events and notices out
//! - [`track`] / [`remote`]: ownership of local tracks, bookkeeping of remote ones
//! - [`view`]: snapshot handed to the presentation layer
//! - [`loopback`]: an in-process engine for demos and tests
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use vcall_client_core::{ControllerConfig, JoinOptions, SessionController};
//! use vcall_client_core::loopback::LoopbackEngine;
//!
//! # tokio_test::block_on(async {
//! let mut controller = SessionController::new(Arc::new(LoopbackEngine::new()), ControllerConfig::new());
//! let uid = controller.join(JoinOptions::new("app-id", "lobby")).await.unwrap();
//! println!("joined as {}", uid);
//! controller.leave().await.unwrap();
//! # })
//! ```

#![warn(rust_2018_idioms)]

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod loopback;
pub mod remote;
pub mod sdk;
pub mod track;
pub mod types;
pub mod view;

pub use config::{AudioTrackConfig, ClientConfig, ControllerConfig, JoinOptions, VideoTrackConfig};
pub use controller::SessionController;
pub use error::{ClientError, ClientResult, Operation, RtcError, RtcResult};
pub use events::{ClientEvent, Notice, NoticeLevel, RemoteEvent};
pub use remote::{RemoteParticipant, RemoteUsers, Unpublished};
pub use sdk::{LocalTrack, LocalTrackRef, RemoteTrack, RemoteTrackRef, RemoteUser, RtcClient, RtcEngine};
pub use track::LocalTrackHandle;
pub use types::{ChannelMode, EncoderParameters, EncoderProfile, MediaKind, SessionState, Uid, VideoCodec};
pub use view::{SessionView, TrackRenderer, TrackSummary, TrackTile};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
