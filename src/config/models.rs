use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::path::PathBuf;

use crate::manifest::TeamsVersion;
use crate::thumbnail::ThumbnailSize;

/// Top-level configuration
///
/// Relative `image_dir` and `thumbnail_dir` values are resolved against the
/// directory holding the config file when loaded through [`Config::load`].
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_image_dir")]
    pub image_dir: PathBuf,
    #[serde(default = "default_thumbnail_dir")]
    pub thumbnail_dir: PathBuf,
    #[serde(default)]
    pub thumbnail_size: ThumbnailSize,
    #[serde(default = "default_listen_address")]
    pub listen_address: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Manifest schema served to the client
    #[serde(default)]
    pub teams_version: TeamsVersion,
    #[serde(default = "default_debug")]
    pub debug: bool,
    /// Seconds between manifest fetches by the client
    #[serde(default = "default_fetch_interval")]
    pub fetch_interval: u32,
    /// Hide the stock Microsoft backgrounds in the client
    #[serde(default = "default_ignore_teams_images")]
    pub ignore_teams_images: bool,
    /// Point the teams-for-linux config at this server on startup
    #[serde(default)]
    pub update_teams_config: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_dir: default_image_dir(),
            thumbnail_dir: default_thumbnail_dir(),
            thumbnail_size: ThumbnailSize::default(),
            listen_address: default_listen_address(),
            port: default_port(),
            teams_version: TeamsVersion::default(),
            debug: default_debug(),
            fetch_interval: default_fetch_interval(),
            ignore_teams_images: default_ignore_teams_images(),
            update_teams_config: false,
        }
    }
}

impl Config {
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_address, self.port)
    }
}

fn default_image_dir() -> PathBuf {
    PathBuf::from("images")
}

fn default_thumbnail_dir() -> PathBuf {
    PathBuf::from("thumbs")
}

fn default_listen_address() -> IpAddr {
    IpAddr::V6(Ipv6Addr::LOCALHOST)
}

fn default_port() -> u16 {
    6789
}

fn default_debug() -> bool {
    true
}

fn default_fetch_interval() -> u32 {
    60
}

fn default_ignore_teams_images() -> bool {
    true
}
