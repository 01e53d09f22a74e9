use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Deserialize;

use spyglass_protocol::codec::DEFAULT_MAX_FRAME_BYTES;
use spyglass_protocol::files::DEFAULT_MAX_FILE_BYTES;

/// Host configuration, loaded from a TOML file with CLI overrides.
#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// IP address to bind on (default "0.0.0.0").
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port for the video stream.
    #[serde(default = "default_video_port")]
    pub video_port: u16,

    /// TCP port for control traffic (input events, file transfers).
    #[serde(default = "default_control_port")]
    pub control_port: u16,

    /// Target capture rate, 1..=60.
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Downscale factor applied to both dimensions, in (0, 1].
    #[serde(default = "default_scale")]
    pub scale: f32,

    /// JPEG encoder quality, 1..=100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Ceiling on any incoming frame's length prefix.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: u32,

    /// Ceiling on an announced incoming file size.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    /// Location of the 32-byte pre-shared key.
    #[serde(default = "default_key_path")]
    pub key_path: PathBuf,

    /// Directory incoming files are saved under.
    #[serde(default = "default_recv_dir")]
    pub recv_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_video_port() -> u16 {
    5000
}

fn default_control_port() -> u16 {
    5001
}

fn default_fps() -> u32 {
    20
}

fn default_scale() -> f32 {
    0.8
}

fn default_jpeg_quality() -> u8 {
    70
}

fn default_max_frame_bytes() -> u32 {
    DEFAULT_MAX_FRAME_BYTES
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

fn default_key_path() -> PathBuf {
    spyglass_crypto::DEFAULT_KEY_PATH.into()
}

fn default_recv_dir() -> PathBuf {
    "received_files".into()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            video_port: default_video_port(),
            control_port: default_control_port(),
            fps: default_fps(),
            scale: default_scale(),
            jpeg_quality: default_jpeg_quality(),
            max_frame_bytes: default_max_frame_bytes(),
            max_file_bytes: default_max_file_bytes(),
            key_path: default_key_path(),
            recv_dir: default_recv_dir(),
        }
    }
}

impl HostConfig {
    /// Reject out-of-range values before anything binds or captures.
    pub fn validate(&self) -> Result<()> {
        if !(1..=60).contains(&self.fps) {
            bail!("fps must be in 1..=60, got {}", self.fps);
        }
        if !(self.scale > 0.0 && self.scale <= 1.0) {
            bail!("scale must be in (0, 1], got {}", self.scale);
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            bail!("jpeg_quality must be in 1..=100, got {}", self.jpeg_quality);
        }
        if self.video_port == self.control_port {
            bail!("video_port and control_port must differ");
        }
        Ok(())
    }
}
