//! Image catalog: walks the image root and produces manifest entries.
//!
//! Listing is lazy and starts from scratch on every call. Each accepted file
//! gets its thumbnail ensured right before its entry is yielded, so a
//! finished walk leaves a complete thumbnail tree behind.

mod entry;
mod extension;

pub use entry::ImageEntry;
pub(crate) use entry::url_path;
pub use extension::ImageExtension;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use crate::config::Config;
use crate::manifest::{self, Manifest, TeamsVersion};
use crate::thumbnail::{ThumbnailCache, ThumbnailError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to walk image directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to create thumbnail directory {}: {source}", path.display())]
    ThumbnailDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Thumbnail(#[from] ThumbnailError),
}

pub struct ImageCatalog {
    image_root: PathBuf,
    thumbnails: ThumbnailCache,
    version: TeamsVersion,
}

impl ImageCatalog {
    pub fn new(
        image_root: impl Into<PathBuf>,
        thumbnails: ThumbnailCache,
        version: TeamsVersion,
    ) -> Self {
        Self {
            image_root: image_root.into(),
            thumbnails,
            version,
        }
    }

    /// Catalog over the configured image and thumbnail directories.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.image_dir,
            ThumbnailCache::new(&config.thumbnail_dir, config.thumbnail_size),
            config.teams_version,
        )
    }

    pub fn image_root(&self) -> &Path {
        &self.image_root
    }

    pub fn thumbnails(&self) -> &ThumbnailCache {
        &self.thumbnails
    }

    pub fn version(&self) -> TeamsVersion {
        self.version
    }

    /// Lazily walks the image root depth-first, sorted by file name.
    ///
    /// Symlinks are not followed and the thumbnail root is never descended
    /// into, even when it sits below the image root. The iterator stops being
    /// useful after the first error; callers are expected to abort on it.
    pub fn entries(&self) -> Entries<'_> {
        let walk = WalkDir::new(&self.image_root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Entries {
            catalog: self,
            walk,
        }
    }

    /// Collects every entry, failing on the first error.
    pub fn list(&self) -> Result<Vec<ImageEntry>, CatalogError> {
        self.entries().collect()
    }

    /// Builds the manifest for the configured client version.
    pub fn manifest(&self) -> Result<Manifest, CatalogError> {
        Ok(manifest::build(self.list()?, self.version))
    }

    fn admit(&self, path: &Path, ext: ImageExtension) -> Result<ImageEntry, CatalogError> {
        let relative = path.strip_prefix(&self.image_root).unwrap_or(path);
        self.prepare_thumbnail_dirs(relative)?;
        self.thumbnails.ensure(path, relative)?;
        Ok(ImageEntry::new(relative, ext, self.version.api_prefix()))
    }

    /// The thumbnail cache only creates the immediate parent of a thumbnail;
    /// everything above it is created here so nested albums work.
    fn prepare_thumbnail_dirs(&self, relative: &Path) -> Result<(), CatalogError> {
        let thumb = self.thumbnails.thumbnail_path(relative);
        let Some(grandparent) = thumb.parent().and_then(Path::parent) else {
            return Ok(());
        };
        if thumb.exists() || grandparent.exists() {
            return Ok(());
        }
        fs::create_dir_all(grandparent).map_err(|source| CatalogError::ThumbnailDir {
            path: grandparent.to_path_buf(),
            source,
        })
    }
}

/// Iterator returned by [`ImageCatalog::entries`].
pub struct Entries<'a> {
    catalog: &'a ImageCatalog,
    walk: walkdir::IntoIter,
}

impl Iterator for Entries<'_> {
    type Item = Result<ImageEntry, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walk.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err.into())),
            };

            let file_type = entry.file_type();
            if file_type.is_dir() && entry.path() == self.catalog.thumbnails.root() {
                tracing::debug!(path = %entry.path().display(), "Skipping thumbnail directory");
                self.walk.skip_current_dir();
                continue;
            }
            if file_type.is_symlink() {
                tracing::debug!(path = %entry.path().display(), "Skipping symlink");
                continue;
            }
            if !file_type.is_file() {
                continue;
            }
            let Some(ext) = ImageExtension::from_path(entry.path()) else {
                tracing::trace!(path = %entry.path().display(), "Skipping non-image file");
                continue;
            };

            return Some(self.catalog.admit(entry.path(), ext));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thumbnail::ThumbnailSize;
    use image::RgbImage;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        images: PathBuf,
        thumbs: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let images = dir.path().join("images");
            let thumbs = dir.path().join("thumbs");
            fs::create_dir(&images).unwrap();
            fs::create_dir(&thumbs).unwrap();
            Self {
                _dir: dir,
                images,
                thumbs,
            }
        }

        fn image(&self, relative: &str) {
            let path = self.images.join(relative);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            RgbImage::from_pixel(64, 48, image::Rgb([10, 120, 250]))
                .save(path)
                .unwrap();
        }

        fn catalog(&self, version: TeamsVersion) -> ImageCatalog {
            ImageCatalog::new(
                &self.images,
                ThumbnailCache::new(&self.thumbs, ThumbnailSize::new(32, 32)),
                version,
            )
        }
    }

    #[test]
    fn test_only_accepted_extensions_are_listed() {
        let fixture = Fixture::new();
        fixture.image("a.png");
        fixture.image("b.jpg");
        fixture.image("c.JPEG");
        fixture.image("d.gif");
        fs::write(fixture.images.join("notes.txt"), b"text").unwrap();
        fs::write(fixture.images.join("README"), b"text").unwrap();

        let entries = fixture.catalog(TeamsVersion::V1).list().unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        let types: Vec<_> = entries.iter().map(|e| e.filetype.as_str()).collect();

        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(types, vec!["png", "jpg", "jpg", "jpg"]);
    }

    #[test]
    fn test_same_stem_in_different_directories() {
        let fixture = Fixture::new();
        fixture.image("one/shot.png");
        fixture.image("two/shot.png");

        let entries = fixture.catalog(TeamsVersion::V1).list().unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.id == "shot" && e.name == "shot"));
        assert_eq!(entries[0].src, "/images/one/shot.png");
        assert_eq!(entries[1].src, "/images/two/shot.png");
    }

    #[test]
    fn test_listing_generates_mirrored_thumbnails() {
        let fixture = Fixture::new();
        fixture.image("deep/er/pic.gif");

        let entries = fixture.catalog(TeamsVersion::V2).list().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].thumb_src,
            "/evergreen-assets/backgroundimages/thumbnails/deep/er/pic.gif.jpg"
        );
        // Thumbnail keeps the original extension.
        assert!(fixture.thumbs.join("deep/er/pic.gif").exists());
        assert!(!fixture.thumbs.join("deep/er/pic.gif.jpg").exists());
    }

    #[test]
    fn test_entries_are_restartable() {
        let fixture = Fixture::new();
        fixture.image("a.png");
        let catalog = fixture.catalog(TeamsVersion::V2);

        let first: Vec<_> = catalog.entries().collect::<Result<_, _>>().unwrap();
        fixture.image("b.png");
        let second: Vec<_> = catalog.entries().collect::<Result<_, _>>().unwrap();

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(first[0], second[0]);
    }

    #[test]
    fn test_broken_image_fails_the_listing() {
        let fixture = Fixture::new();
        fixture.image("a.png");
        fs::write(fixture.images.join("b.png"), b"garbage").unwrap();

        let err = fixture.catalog(TeamsVersion::V2).list().unwrap_err();
        match err {
            CatalogError::Thumbnail(err) => assert!(err.path.ends_with("b.png")),
            other => panic!("expected thumbnail error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let fixture = Fixture::new();
        fixture.image("real/a.png");
        std::os::unix::fs::symlink(fixture.images.join("real/a.png"), fixture.images.join("b.png"))
            .unwrap();
        std::os::unix::fs::symlink(fixture.images.join("real"), fixture.images.join("mirror"))
            .unwrap();

        let entries = fixture.catalog(TeamsVersion::V1).list().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].src, "/images/real/a.png");
    }

    #[test]
    fn test_missing_root_is_a_walk_error() {
        let fixture = Fixture::new();
        let catalog = ImageCatalog::new(
            fixture.images.join("absent"),
            ThumbnailCache::new(&fixture.thumbs, ThumbnailSize::default()),
            TeamsVersion::V2,
        );

        assert!(matches!(catalog.list(), Err(CatalogError::Walk(_))));
    }

    #[test]
    fn test_manifest_uses_configured_version() {
        let fixture = Fixture::new();
        fixture.image("a.png");

        let v1 = fixture.catalog(TeamsVersion::V1).manifest().unwrap();
        let v2 = fixture.catalog(TeamsVersion::V2).manifest().unwrap();

        assert!(matches!(v1, Manifest::Bare(_)));
        assert!(matches!(v2, Manifest::Wrapped { .. }));
        assert_eq!(v1.entries()[0].src, "/images/a.png");
        assert_eq!(
            v2.entries()[0].src,
            "/evergreen-assets/backgroundimages/images/a.png"
        );
    }
}
