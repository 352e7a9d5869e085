//! Accepted image extensions and their public relabeling.

use std::fmt;
use std::path::Path;

/// An image extension the catalog accepts.
///
/// The Teams client only knows about `png` and `jpg` backgrounds, so `jpeg`
/// and `gif` files are advertised under `jpg`. The files themselves are never
/// re-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageExtension {
    Png,
    Jpg,
    Jpeg,
    Gif,
}

impl ImageExtension {
    pub const ALL: [ImageExtension; 4] = [
        ImageExtension::Png,
        ImageExtension::Jpg,
        ImageExtension::Jpeg,
        ImageExtension::Gif,
    ];

    /// Parses an extension without the leading dot, ignoring case.
    pub fn parse(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(ext))
    }

    /// Extension of `path`, if it is one of the accepted ones.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::parse)
    }

    /// Extension as found on disk (lowercased).
    pub fn as_str(self) -> &'static str {
        match self {
            ImageExtension::Png => "png",
            ImageExtension::Jpg => "jpg",
            ImageExtension::Jpeg => "jpeg",
            ImageExtension::Gif => "gif",
        }
    }

    /// Extension shown to the client.
    pub fn public(self) -> &'static str {
        self.relabeled().unwrap_or(self.as_str())
    }

    /// The substitute extension, or `None` when the name is used as-is.
    pub fn relabeled(self) -> Option<&'static str> {
        match self {
            ImageExtension::Jpeg | ImageExtension::Gif => Some("jpg"),
            ImageExtension::Png | ImageExtension::Jpg => None,
        }
    }
}

impl fmt::Display for ImageExtension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
