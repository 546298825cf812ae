//! Command-line flags and the optional TOML settings file

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use vcall_client_core::{EncoderProfile, JoinOptions, Uid, VideoCodec};

/// Join a channel with the loopback engine and render who is in it
#[derive(Parser, Debug)]
#[command(name = "vcall", version, about)]
pub struct Cli {
    /// Application id
    #[arg(long, env = "VCALL_APP_ID")]
    pub app_id: Option<String>,

    /// Channel name
    #[arg(long, env = "VCALL_CHANNEL")]
    pub channel: Option<String>,

    /// Access token
    #[arg(long, env = "VCALL_TOKEN")]
    pub token: Option<String>,

    /// Local uid (numeric or string); assigned by the server when omitted
    #[arg(long, env = "VCALL_UID")]
    pub uid: Option<Uid>,

    /// URL or query string to prefill the join form (appId, channel, token, uid)
    #[arg(long)]
    pub query: Option<String>,

    /// TOML settings file
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Video codec for the join
    #[arg(long, value_parser = parse_codec)]
    pub codec: Option<VideoCodec>,

    /// Encoder profile applied to the camera after joining
    #[arg(long, value_parser = parse_profile)]
    pub profile: Option<EncoderProfile>,

    /// Number of simulated remote participants
    #[arg(long, default_value_t = 2)]
    pub peers: u32,

    /// Simulated SDK latency in milliseconds
    #[arg(long, default_value_t = 0)]
    pub latency_ms: u64,
}

fn parse_codec(value: &str) -> Result<VideoCodec, String> {
    value.parse().map_err(|e: vcall_client_core::ClientError| e.to_string())
}

fn parse_profile(value: &str) -> Result<EncoderProfile, String> {
    value.parse().map_err(|e: vcall_client_core::ClientError| e.to_string())
}

/// Contents of the settings file
///
/// ```toml
/// codec = "vp9"
/// profile = "720p_1"
///
/// [join]
/// appId = "..."
/// channel = "lobby"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct FileSettings {
    #[serde(default)]
    pub join: Option<JoinOptions>,
    pub codec: Option<VideoCodec>,
    pub profile: Option<EncoderProfile>,
}

impl FileSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing settings file {}", path.display()))
    }
}

/// Resolved demo settings
#[derive(Debug)]
pub struct Settings {
    pub join: JoinOptions,
    pub codec: VideoCodec,
    pub profile: Option<EncoderProfile>,
    pub peers: u32,
    pub latency: Duration,
}

impl Cli {
    /// Combine file, URL query and flags; later sources win
    pub fn resolve(self) -> Result<Settings> {
        let file = match &self.config {
            Some(path) => FileSettings::load(path)?,
            None => FileSettings::default(),
        };

        let mut join = file.join.unwrap_or_default();
        if let Some(query) = &self.query {
            join = join.merge(JoinOptions::from_query(query)?);
        }
        join = join.merge(JoinOptions {
            app_id: self.app_id.unwrap_or_default(),
            channel: self.channel.unwrap_or_default(),
            token: self.token,
            uid: self.uid,
        });

        Ok(Settings {
            join,
            codec: self.codec.or(file.codec).unwrap_or_default(),
            profile: self.profile.or(file.profile),
            peers: self.peers,
            latency: Duration::from_millis(self.latency_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_query_prefill() {
        let cli = Cli::parse_from([
            "vcall",
            "--query",
            "appId=from-query&channel=lobby&uid=3",
            "--channel",
            "stage",
            "--codec",
            "av1",
        ]);
        let settings = cli.resolve().unwrap();
        assert_eq!(settings.join.app_id, "from-query");
        assert_eq!(settings.join.channel, "stage");
        assert_eq!(settings.join.uid, Some(Uid::Number(3)));
        assert_eq!(settings.codec, VideoCodec::Av1);
    }

    #[test]
    fn settings_file_parses_join_section() {
        let settings: FileSettings = toml::from_str(
            r#"
            codec = "h264"
            profile = "360p_1"

            [join]
            appId = "file-app"
            channel = "room"
            "#,
        )
        .unwrap();
        assert_eq!(settings.codec, Some(VideoCodec::H264));
        assert_eq!(settings.profile, Some(EncoderProfile::P360_1));
        assert_eq!(settings.join.unwrap().app_id, "file-app");
    }

    #[test]
    fn unknown_codec_is_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["vcall", "--codec", "hevc"]).is_err());
    }
}
