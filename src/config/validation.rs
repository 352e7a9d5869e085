use super::models::Config;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("thumbnail_size must be positive in both dimensions, got {width}x{height}")]
    InvalidThumbnailSize { width: u32, height: u32 },

    #[error("port must be non-zero")]
    InvalidPort,

    #[error("fetch_interval must be positive")]
    InvalidFetchInterval,

    #[error("image_dir and thumbnail_dir must differ: {0}")]
    SharedDirectory(String),

    #[error("{inner} must not be inside {outer}")]
    NestedDirectory { inner: String, outer: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_thumbnail_size(config)?;
    validate_server(config)?;
    validate_directories(config)?;
    Ok(())
}

fn validate_thumbnail_size(config: &Config) -> Result<(), ValidationError> {
    let size = config.thumbnail_size;
    if size.width == 0 || size.height == 0 {
        return Err(ValidationError::InvalidThumbnailSize {
            width: size.width,
            height: size.height,
        });
    }
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    if config.port == 0 {
        return Err(ValidationError::InvalidPort);
    }
    if config.fetch_interval == 0 {
        return Err(ValidationError::InvalidFetchInterval);
    }
    Ok(())
}

/// Thumbnails are written into their own tree; sharing it with the sources,
/// or nesting one inside the other, would make thumbnails catalog entries.
fn validate_directories(config: &Config) -> Result<(), ValidationError> {
    let images = normalize(&config.image_dir);
    let thumbnails = normalize(&config.thumbnail_dir);

    if images == thumbnails {
        return Err(ValidationError::SharedDirectory(
            config.image_dir.display().to_string(),
        ));
    }
    let nested = if thumbnails.starts_with(&images) {
        Some((&config.thumbnail_dir, &config.image_dir))
    } else if images.starts_with(&thumbnails) {
        Some((&config.image_dir, &config.thumbnail_dir))
    } else {
        None
    };
    if let Some((inner, outer)) = nested {
        return Err(ValidationError::NestedDirectory {
            inner: inner.display().to_string(),
            outer: outer.display().to_string(),
        });
    }
    Ok(())
}

/// Lexically folds `.` and `..` so `bg/../bg/thumbs` compares as `bg/thumbs`.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}
