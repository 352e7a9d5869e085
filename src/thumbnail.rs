//! On-demand thumbnail cache.
//!
//! Thumbnails live under their own root, mirroring the relative path and the
//! original extension of each source image. A thumbnail that exists on disk
//! is a cache hit; nothing compares it against the source again, so deleting
//! the file is the only way to have it regenerated.

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Failure to produce a thumbnail for `path` (the source image).
#[derive(Debug, Error)]
#[error("could not create thumbnail for {}: {cause}", path.display())]
pub struct ThumbnailError {
    pub path: PathBuf,
    #[source]
    pub cause: ThumbnailCause,
}

#[derive(Debug, Error)]
pub enum ThumbnailCause {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("could not move thumbnail into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Bounding box for thumbnails, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl ThumbnailSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an image of `width`x`height` scaled down to fit the box.
    ///
    /// Aspect ratio is kept and images already inside the box are not enlarged.
    pub fn fit(&self, width: u32, height: u32) -> (u32, u32) {
        if width <= self.width && height <= self.height {
            return (width, height);
        }

        let ratio = f64::min(
            self.width as f64 / width as f64,
            self.height as f64 / height as f64,
        );
        let scaled_width = ((width as f64 * ratio).round() as u32).clamp(1, self.width);
        let scaled_height = ((height as f64 * ratio).round() as u32).clamp(1, self.height);

        (scaled_width, scaled_height)
    }
}

impl Default for ThumbnailSize {
    fn default() -> Self {
        Self::new(128, 128)
    }
}

impl From<(u32, u32)> for ThumbnailSize {
    fn from((width, height): (u32, u32)) -> Self {
        Self { width, height }
    }
}

impl From<ThumbnailSize> for (u32, u32) {
    fn from(size: ThumbnailSize) -> Self {
        (size.width, size.height)
    }
}

/// What [`ThumbnailCache::ensure`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured {
    /// The thumbnail was already on disk.
    Cached,
    /// A new thumbnail was written.
    Generated,
}

/// Thumbnail store rooted at the configured thumbnail directory.
///
/// Concurrent callers asking for the same missing thumbnail are serialized on
/// a lock keyed by the thumbnail path, so it is generated once.
pub struct ThumbnailCache {
    root: PathBuf,
    size: ThumbnailSize,
    in_flight: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    generated: AtomicU64,
}

impl ThumbnailCache {
    pub fn new(root: impl Into<PathBuf>, size: ThumbnailSize) -> Self {
        Self {
            root: root.into(),
            size,
            in_flight: Mutex::new(HashMap::new()),
            generated: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn size(&self) -> ThumbnailSize {
        self.size
    }

    /// Number of thumbnails this cache has written since it was created.
    pub fn generated(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    /// Where the thumbnail for the image at `relative` (below the image root) lives.
    pub fn thumbnail_path(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    /// Makes sure the thumbnail for `source` exists, generating it if needed.
    pub fn ensure(&self, source: &Path, relative: &Path) -> Result<Ensured, ThumbnailError> {
        let thumb = self.thumbnail_path(relative);
        if thumb.exists() {
            tracing::debug!(thumbnail = %thumb.display(), "Thumbnail cache hit");
            return Ok(Ensured::Cached);
        }

        let lock = self
            .in_flight
            .lock()
            .entry(thumb.clone())
            .or_default()
            .clone();

        let outcome = {
            let _guard = lock.lock();
            ensure_thumbnail(source, &thumb, self.size)
        };

        self.in_flight.lock().remove(&thumb);
        if let Ok(Ensured::Generated) = outcome {
            self.generated.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }
}

/// Creates `thumb` from `source`, scaled to fit within `size`, unless `thumb` exists.
///
/// Only the immediate parent of `thumb` is created; a missing grandparent is
/// an error. The output format follows the extension of `thumb`. The file is
/// written next to its destination and moved into place without replacing
/// anything already there.
pub fn ensure_thumbnail(
    source: &Path,
    thumb: &Path,
    size: ThumbnailSize,
) -> Result<Ensured, ThumbnailError> {
    if thumb.exists() {
        return Ok(Ensured::Cached);
    }

    tracing::info!(
        source = %source.display(),
        thumbnail = %thumb.display(),
        "Creating thumbnail"
    );

    let written = write_thumbnail(source, thumb, size).map_err(|cause| ThumbnailError {
        path: source.to_path_buf(),
        cause,
    })?;

    Ok(if written {
        Ensured::Generated
    } else {
        Ensured::Cached
    })
}

fn write_thumbnail(source: &Path, thumb: &Path, size: ThumbnailSize) -> Result<bool, ThumbnailCause> {
    let parent = match thumb.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !parent.exists() {
        match fs::create_dir(parent) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {}
            Err(err) => return Err(err.into()),
        }
    }

    let format = ImageFormat::from_path(thumb)?;
    let image = ImageReader::open(source)?.with_guessed_format()?.decode()?;
    let resized = scale_to_fit(image, size);

    let mut staged = NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(staged.as_file_mut());
        resized.write_to(&mut writer, format)?;
        writer.flush()?;
    }

    match staged.persist_noclobber(thumb) {
        Ok(_) => Ok(true),
        Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(err) => Err(err.into()),
    }
}

fn scale_to_fit(image: DynamicImage, size: ThumbnailSize) -> DynamicImage {
    let (width, height) = size.fit(image.width(), image.height());
    if (width, height) == (image.width(), image.height()) {
        return image;
    }
    image.resize_exact(width, height, FilterType::Lanczos3)
}
