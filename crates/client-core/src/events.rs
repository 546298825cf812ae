//! Events flowing into and out of the session controller
//!
//! # Event Types
//!
//! - **Remote Events** - SDK notifications about other participants
//!   ([`RemoteEvent`]), delivered in order on an mpsc channel
//! - **Client Events** - what the controller reports to the presentation
//!   layer ([`ClientEvent`]), fanned out on a broadcast channel
//! - **Notices** - user-visible success/error messages ([`Notice`])
//!
//! # Usage Examples
//!
//! ```rust
//! use vcall_client_core::events::{Notice, NoticeLevel};
//!
//! let notice = Notice::error("PERMISSION_DENIED: camera blocked");
//! assert_eq!(notice.level, NoticeLevel::Error);
//! assert!(notice.is_error());
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sdk::RemoteUser;
use crate::types::{MediaKind, SessionState, Uid};

/// Notification from the SDK about a remote participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteEvent {
    /// A participant started publishing a media kind ("user-published")
    UserPublished { user: RemoteUser, kind: MediaKind },
    /// A participant stopped publishing a media kind ("user-unpublished")
    UserUnpublished { user: RemoteUser, kind: MediaKind },
}

impl RemoteEvent {
    /// Participant the event is about
    pub fn uid(&self) -> &Uid {
        match self {
            RemoteEvent::UserPublished { user, .. } | RemoteEvent::UserUnpublished { user, .. } => &user.uid,
        }
    }

    /// Media kind the event is about
    pub fn kind(&self) -> MediaKind {
        match self {
            RemoteEvent::UserPublished { kind, .. } | RemoteEvent::UserUnpublished { kind, .. } => *kind,
        }
    }
}

/// Severity of a user-visible message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-visible message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Notice {
    /// Success message
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Error message
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    /// Whether this is an error message
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Event published by the controller to the presentation layer
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Session state transition
    StateChanged {
        previous: SessionState,
        current: SessionState,
    },
    /// A participant became visible, changed tracks, or was removed
    RemoteUsersChanged { count: usize },
    /// A message for the user
    Notice(Notice),
}
