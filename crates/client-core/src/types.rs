//! Core value types shared by the controller, the SDK contract and the view
//!
//! # Type Categories
//!
//! - **Identity** - [`Uid`], the server-assigned participant identifier
//! - **Media** - [`MediaKind`], [`VideoCodec`], [`EncoderProfile`]
//! - **Session** - [`ChannelMode`], [`SessionState`]

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Participant identifier
///
/// Channels accept either numeric or string user ids. Numeric ids order
/// before string ids, and numeric ids order ascending.
///
/// ```rust
/// use vcall_client_core::Uid;
///
/// let uid: Uid = "1234".parse().unwrap();
/// assert_eq!(uid, Uid::Number(1234));
///
/// let named: Uid = "alice".parse().unwrap();
/// assert_eq!(named.to_string(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Uid {
    /// 32-bit numeric id
    Number(u32),
    /// String id
    Text(String),
}

impl Uid {
    /// Whether the id carries no value (an empty string id)
    pub fn is_empty(&self) -> bool {
        matches!(self, Uid::Text(text) if text.is_empty())
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uid::Number(n) => write!(f, "{}", n),
            Uid::Text(s) => f.write_str(s),
        }
    }
}

impl From<u32> for Uid {
    fn from(value: u32) -> Self {
        Uid::Number(value)
    }
}

impl From<&str> for Uid {
    fn from(value: &str) -> Self {
        Uid::Text(value.to_string())
    }
}

impl FromStr for Uid {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ClientError::config("uid must not be empty"));
        }
        match trimmed.parse::<u32>() {
            Ok(n) => Ok(Uid::Number(n)),
            Err(_) => Ok(Uid::Text(trimmed.to_string())),
        }
    }
}

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Microphone / remote audio
    Audio,
    /// Camera / remote video
    Video,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Audio => f.write_str("audio"),
            MediaKind::Video => f.write_str("video"),
        }
    }
}

impl FromStr for MediaKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "audio" => Ok(MediaKind::Audio),
            "video" => Ok(MediaKind::Video),
            other => Err(ClientError::config(format!("unknown media kind '{}'", other))),
        }
    }
}

/// Channel profile requested when creating a client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMode {
    /// Communication: every participant may publish
    #[default]
    Rtc,
    /// Live broadcast: hosts publish, audience subscribes
    Live,
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelMode::Rtc => f.write_str("rtc"),
            ChannelMode::Live => f.write_str("live"),
        }
    }
}

/// Video codec negotiated at join time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    /// VP8 (default)
    #[default]
    Vp8,
    /// VP9
    Vp9,
    /// H.264
    H264,
    /// AV1
    Av1,
}

impl VideoCodec {
    /// All codecs offered by the codec selector
    pub const ALL: [VideoCodec; 4] = [VideoCodec::Vp8, VideoCodec::Vp9, VideoCodec::H264, VideoCodec::Av1];
}

impl fmt::Display for VideoCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VideoCodec::Vp8 => "vp8",
            VideoCodec::Vp9 => "vp9",
            VideoCodec::H264 => "h264",
            VideoCodec::Av1 => "av1",
        };
        f.write_str(name)
    }
}

impl FromStr for VideoCodec {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VideoCodec::ALL
            .into_iter()
            .find(|codec| codec.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClientError::config(format!("unsupported codec '{}'", s)))
    }
}

/// Video encoder configuration preset
///
/// Presets are named `<height>p_<variant>` and map to a resolution, frame
/// rate and target bitrate. Changing the preset is applied live to the local
/// camera track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EncoderProfile {
    #[serde(rename = "120p_1")]
    P120_1,
    #[serde(rename = "180p_1")]
    P180_1,
    #[serde(rename = "240p_1")]
    P240_1,
    #[serde(rename = "360p_1")]
    P360_1,
    #[serde(rename = "480p_1")]
    #[default]
    P480_1,
    #[serde(rename = "720p_1")]
    P720_1,
    #[serde(rename = "720p_2")]
    P720_2,
    #[serde(rename = "1080p_1")]
    P1080_1,
    #[serde(rename = "1080p_2")]
    P1080_2,
}

/// Resolved encoder parameters for a preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParameters {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
    pub bitrate_kbps: u32,
}

impl EncoderProfile {
    /// All presets offered by the profile selector
    pub const ALL: [EncoderProfile; 9] = [
        EncoderProfile::P120_1,
        EncoderProfile::P180_1,
        EncoderProfile::P240_1,
        EncoderProfile::P360_1,
        EncoderProfile::P480_1,
        EncoderProfile::P720_1,
        EncoderProfile::P720_2,
        EncoderProfile::P1080_1,
        EncoderProfile::P1080_2,
    ];

    /// Preset name as accepted by the SDK
    pub fn name(&self) -> &'static str {
        match self {
            EncoderProfile::P120_1 => "120p_1",
            EncoderProfile::P180_1 => "180p_1",
            EncoderProfile::P240_1 => "240p_1",
            EncoderProfile::P360_1 => "360p_1",
            EncoderProfile::P480_1 => "480p_1",
            EncoderProfile::P720_1 => "720p_1",
            EncoderProfile::P720_2 => "720p_2",
            EncoderProfile::P1080_1 => "1080p_1",
            EncoderProfile::P1080_2 => "1080p_2",
        }
    }

    /// Resolution, frame rate and bitrate for this preset
    pub fn parameters(&self) -> EncoderParameters {
        let (width, height, frame_rate, bitrate_kbps) = match self {
            EncoderProfile::P120_1 => (160, 120, 15, 65),
            EncoderProfile::P180_1 => (320, 180, 15, 140),
            EncoderProfile::P240_1 => (320, 240, 15, 200),
            EncoderProfile::P360_1 => (640, 360, 15, 400),
            EncoderProfile::P480_1 => (640, 480, 15, 500),
            EncoderProfile::P720_1 => (1280, 720, 15, 1130),
            EncoderProfile::P720_2 => (1280, 720, 30, 2000),
            EncoderProfile::P1080_1 => (1920, 1080, 15, 2080),
            EncoderProfile::P1080_2 => (1920, 1080, 30, 3000),
        };
        EncoderParameters {
            width,
            height,
            frame_rate,
            bitrate_kbps,
        }
    }
}

impl fmt::Display for EncoderProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EncoderProfile {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EncoderProfile::ALL
            .into_iter()
            .find(|profile| profile.name() == s.trim())
            .ok_or_else(|| ClientError::config(format!("unknown encoder profile '{}'", s)))
    }
}

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionState {
    /// Not in a channel
    #[default]
    Idle,
    /// Joined and publishing
    Joined,
}
