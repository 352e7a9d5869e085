use serde::{Deserialize, Serialize};
use std::path::{Component, Path};

use super::extension::ImageExtension;

/// One background image as advertised to the Teams client.
///
/// `id` and `name` both carry the file stem; the client expects both keys.
/// Two files with the same stem in different directories produce two entries
/// with equal `id`s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub filetype: String,
    pub id: String,
    pub name: String,
    pub src: String,
    pub thumb_src: String,
}

impl ImageEntry {
    /// Builds the entry for `relative` (a path below the image root).
    ///
    /// `prefix` is prepended to `/images/...` and `/thumbnails/...`. When the
    /// extension is relabeled, the public extension is appended to the
    /// relative path, so `sub/b.jpeg` becomes `sub/b.jpeg.jpg`.
    pub fn new(relative: &Path, ext: ImageExtension, prefix: &str) -> Self {
        let stem = relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut public_name = url_path(relative);
        if let Some(relabeled) = ext.relabeled() {
            public_name.push('.');
            public_name.push_str(relabeled);
        }

        Self {
            filetype: ext.public().to_string(),
            id: stem.clone(),
            name: stem,
            src: format!("{prefix}/images/{public_name}"),
            thumb_src: format!("{prefix}/thumbnails/{public_name}"),
        }
    }
}

/// Joins the normal components of `path` with `/`, whatever the host separator.
pub(crate) fn url_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
