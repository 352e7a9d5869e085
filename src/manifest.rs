//! Manifest documents served as `config.json`.
//!
//! Teams v1 expects a bare array of entries; v2 wraps the same array in an
//! object under `videoBackgroundImages` and requests every asset below
//! [`V2_API_PREFIX`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::ImageEntry;

/// Path prefix the v2 client puts in front of every asset request.
pub const V2_API_PREFIX: &str = "/evergreen-assets/backgroundimages";

#[derive(Debug, Error)]
#[error("unsupported teams_version {0}, expected 1 or 2")]
pub struct UnsupportedTeamsVersion(pub u8);

/// Manifest protocol version of the Teams client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum TeamsVersion {
    V1,
    #[default]
    V2,
}

impl TeamsVersion {
    /// Prefix of the public `src`/`thumb_src` paths.
    pub fn api_prefix(self) -> &'static str {
        match self {
            TeamsVersion::V1 => "",
            TeamsVersion::V2 => V2_API_PREFIX,
        }
    }
}

impl TryFrom<u8> for TeamsVersion {
    type Error = UnsupportedTeamsVersion;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TeamsVersion::V1),
            2 => Ok(TeamsVersion::V2),
            other => Err(UnsupportedTeamsVersion(other)),
        }
    }
}

impl From<TeamsVersion> for u8 {
    fn from(version: TeamsVersion) -> Self {
        match version {
            TeamsVersion::V1 => 1,
            TeamsVersion::V2 => 2,
        }
    }
}

/// A manifest in the shape the configured client version expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Manifest {
    Bare(Vec<ImageEntry>),
    Wrapped {
        #[serde(rename = "videoBackgroundImages")]
        video_background_images: Vec<ImageEntry>,
    },
}

impl Manifest {
    pub fn entries(&self) -> &[ImageEntry] {
        match self {
            Manifest::Bare(entries) => entries,
            Manifest::Wrapped {
                video_background_images,
            } => video_background_images,
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

/// Wraps `entries` for `version`, keeping their order.
pub fn build(entries: Vec<ImageEntry>, version: TeamsVersion) -> Manifest {
    match version {
        TeamsVersion::V1 => Manifest::Bare(entries),
        TeamsVersion::V2 => Manifest::Wrapped {
            video_background_images: entries,
        },
    }
}
