//! Join form input and client configuration
//!
//! # Key Components
//!
//! - **JoinOptions** - the join form: app id, channel, optional token and uid
//! - **ClientConfig** - parameters for constructing an RTC client (mode, codec)
//! - **AudioTrackConfig / VideoTrackConfig** - local media acquisition settings
//! - **ControllerConfig** - everything the session controller starts with
//!
//! # Usage Examples
//!
//! ## Prefilling the join form from a URL
//!
//! ```rust
//! use vcall_client_core::{JoinOptions, Uid};
//!
//! let options = JoinOptions::from_query("https://demo.example/call?appId=abc&channel=lobby&uid=7").unwrap();
//! assert_eq!(options.app_id, "abc");
//! assert_eq!(options.channel, "lobby");
//! assert_eq!(options.uid(), Some(&Uid::Number(7)));
//! assert!(options.validate().is_ok());
//! ```
//!
//! ## Building a client configuration
//!
//! ```rust
//! use vcall_client_core::{ClientConfig, ChannelMode, VideoCodec};
//!
//! let config = ClientConfig::new().with_codec(VideoCodec::H264);
//! assert_eq!(config.mode, ChannelMode::Rtc);
//! assert_eq!(config.codec, VideoCodec::H264);
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ClientError, ClientResult};
use crate::types::{ChannelMode, EncoderProfile, Uid, VideoCodec};

/// Longest channel name the SDK accepts, in bytes
pub const MAX_CHANNEL_NAME_BYTES: usize = 64;

/// Longest string uid the SDK accepts, in bytes
pub const MAX_STRING_UID_BYTES: usize = 255;

/// Connection parameters supplied by the join form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinOptions {
    /// Application id issued by the RTC provider
    pub app_id: String,
    /// Channel to join
    pub channel: String,
    /// Access token, if the project requires one
    #[serde(default)]
    pub token: Option<String>,
    /// Desired local uid; the server assigns one when absent
    #[serde(default)]
    pub uid: Option<Uid>,
}

impl JoinOptions {
    /// Create options for an app id and channel
    pub fn new(app_id: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            channel: channel.into(),
            token: None,
            uid: None,
        }
    }

    /// Set the access token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the desired uid
    pub fn with_uid(mut self, uid: impl Into<Uid>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    /// Parse the join form from a URL or bare query string
    ///
    /// Recognised parameters are `appId`, `channel`, `token` and `uid`;
    /// anything else is ignored. Missing parameters stay empty so the form
    /// can be completed from other sources.
    pub fn from_query(input: &str) -> ClientResult<Self> {
        let input = input.trim();
        let pairs: Vec<(String, String)> = if input.contains("://") {
            let url = Url::parse(input)
                .map_err(|e| ClientError::config(format!("invalid url '{}': {}", input, e)))?;
            url.query_pairs().into_owned().collect()
        } else {
            url::form_urlencoded::parse(input.trim_start_matches('?').as_bytes())
                .into_owned()
                .collect()
        };

        let mut options = JoinOptions::default();
        for (key, value) in pairs {
            match key.as_str() {
                "appId" => options.app_id = value,
                "channel" => options.channel = value,
                "token" if !value.is_empty() => options.token = Some(value),
                "uid" if !value.trim().is_empty() => options.uid = Some(value.parse()?),
                _ => {}
            }
        }
        Ok(options)
    }

    /// Overlay non-empty fields from `other` onto these options
    pub fn merge(mut self, other: JoinOptions) -> Self {
        if !other.app_id.is_empty() {
            self.app_id = other.app_id;
        }
        if !other.channel.is_empty() {
            self.channel = other.channel;
        }
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.uid.is_some() {
            self.uid = other.uid;
        }
        self
    }

    /// Token to hand to the SDK; an empty token counts as none
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Uid to hand to the SDK; `0` and the empty string count as none
    pub fn uid(&self) -> Option<&Uid> {
        match &self.uid {
            Some(Uid::Number(0)) => None,
            Some(uid) if uid.is_empty() => None,
            other => other.as_ref(),
        }
    }

    /// Check the form before anything is sent to the SDK
    pub fn validate(&self) -> ClientResult<()> {
        if self.app_id.trim().is_empty() {
            return Err(ClientError::invalid_options("app id is required"));
        }
        if self.channel.trim().is_empty() {
            return Err(ClientError::invalid_options("channel is required"));
        }
        if self.channel.len() > MAX_CHANNEL_NAME_BYTES {
            return Err(ClientError::invalid_options(format!(
                "channel name exceeds {} bytes",
                MAX_CHANNEL_NAME_BYTES
            )));
        }
        if let Some(Uid::Text(text)) = self.uid() {
            if text.len() > MAX_STRING_UID_BYTES {
                return Err(ClientError::invalid_options(format!(
                    "string uid exceeds {} bytes",
                    MAX_STRING_UID_BYTES
                )));
            }
        }
        Ok(())
    }
}

/// Parameters for constructing an RTC client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Channel profile
    pub mode: ChannelMode,
    /// Video codec negotiated at join
    pub codec: VideoCodec,
}

impl ClientConfig {
    /// Default configuration: `rtc` mode with VP8
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the channel mode
    pub fn with_mode(mut self, mode: ChannelMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the video codec
    pub fn with_codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }
}

/// Microphone acquisition settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrackConfig {
    /// Capture device id; the system default when absent
    pub device_id: Option<String>,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for AudioTrackConfig {
    fn default() -> Self {
        Self {
            device_id: None,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

/// Camera acquisition settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTrackConfig {
    /// Capture device id; the system default when absent
    pub device_id: Option<String>,
    /// Initial encoder preset
    pub encoder_profile: EncoderProfile,
}

/// Settings the session controller starts with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub mode: ChannelMode,
    /// Codec for the first join; see `SessionController::set_codec`
    pub codec: VideoCodec,
    pub audio: AudioTrackConfig,
    pub video: VideoTrackConfig,
}

impl ControllerConfig {
    /// Default controller settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial codec
    pub fn with_codec(mut self, codec: VideoCodec) -> Self {
        self.codec = codec;
        self
    }

    /// Set the channel mode
    pub fn with_mode(mut self, mode: ChannelMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the camera's initial encoder preset
    pub fn with_encoder_profile(mut self, profile: EncoderProfile) -> Self {
        self.video.encoder_profile = profile;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_query_is_parsed() {
        let options = JoinOptions::from_query("?appId=app&channel=room%201&token=t0k&uid=bob").unwrap();
        assert_eq!(options.app_id, "app");
        assert_eq!(options.channel, "room 1");
        assert_eq!(options.token(), Some("t0k"));
        assert_eq!(options.uid(), Some(&Uid::from("bob")));
    }

    #[test]
    fn missing_query_fields_stay_empty() {
        let options = JoinOptions::from_query("channel=lobby&unrelated=1").unwrap();
        assert!(options.app_id.is_empty());
        assert_eq!(options.channel, "lobby");
        assert!(options.token.is_none());
        assert!(matches!(options.validate(), Err(ClientError::InvalidOptions { .. })));
    }

    #[test]
    fn zero_uid_and_empty_token_mean_unset() {
        let options = JoinOptions::new("app", "room").with_uid(0u32).with_token("");
        assert_eq!(options.uid(), None);
        assert_eq!(options.token(), None);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn overlong_channel_is_rejected() {
        let options = JoinOptions::new("app", "c".repeat(MAX_CHANNEL_NAME_BYTES + 1));
        assert!(options.validate().is_err());
    }

    #[test]
    fn merge_prefers_non_empty_overrides() {
        let prefill = JoinOptions::new("app", "lobby").with_uid(3u32);
        let flags = JoinOptions {
            channel: "stage".to_string(),
            ..Default::default()
        };
        let merged = prefill.merge(flags);
        assert_eq!(merged.app_id, "app");
        assert_eq!(merged.channel, "stage");
        assert_eq!(merged.uid, Some(Uid::Number(3)));
    }

    #[test]
    fn join_options_deserialize_from_camel_case() {
        let options: JoinOptions =
            serde_json::from_str(r#"{"appId":"a","channel":"c","uid":12}"#).unwrap();
        assert_eq!(options.uid(), Some(&Uid::Number(12)));
        assert_eq!(options.token, None);
    }
}
