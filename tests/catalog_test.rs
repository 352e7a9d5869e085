//! Catalog scenarios against a real directory tree.

use image::{GenericImageView, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use teamster::catalog::{CatalogError, ImageCatalog};
use teamster::config::Config;
use teamster::manifest::{Manifest, TeamsVersion};
use teamster::thumbnail::ThumbnailSize;

fn write_image(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_pixel(width, height, image::Rgb([1, 2, 3]))
        .save(path)
        .unwrap();
}

fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

fn config(dir: &TempDir, version: TeamsVersion) -> Config {
    let config = Config {
        image_dir: dir.path().join("images"),
        thumbnail_dir: dir.path().join("thumbs"),
        thumbnail_size: ThumbnailSize::new(128, 128),
        teams_version: version,
        ..Config::default()
    };
    fs::create_dir_all(&config.image_dir).unwrap();
    fs::create_dir_all(&config.thumbnail_dir).unwrap();
    config
}

#[test]
fn test_end_to_end_scenario() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, TeamsVersion::V2);
    write_image(&config.image_dir.join("a.png"), 640, 480);
    write_image(&config.image_dir.join("sub/b.jpeg"), 300, 900);
    fs::write(config.image_dir.join("c.txt"), "text").unwrap();

    let manifest = ImageCatalog::from_config(&config).manifest().unwrap();

    let Manifest::Wrapped {
        video_background_images: entries,
    } = &manifest
    else {
        panic!("v2 manifest must be wrapped");
    };
    assert_eq!(entries.len(), 2);

    assert_eq!(entries[0].id, "a");
    assert_eq!(entries[0].filetype, "png");
    assert_eq!(entries[0].src, "/evergreen-assets/backgroundimages/images/a.png");

    assert_eq!(entries[1].id, "b");
    assert_eq!(entries[1].filetype, "jpg");
    assert_eq!(
        entries[1].src,
        "/evergreen-assets/backgroundimages/images/sub/b.jpeg.jpg"
    );

    assert_eq!(
        files_under(&config.thumbnail_dir),
        vec![PathBuf::from("a.png"), PathBuf::from("sub/b.jpeg")]
    );

    let a = image::open(config.thumbnail_dir.join("a.png")).unwrap();
    assert_eq!(a.dimensions(), (128, 96));
    let b = image::open(config.thumbnail_dir.join("sub/b.jpeg")).unwrap();
    assert_eq!(b.dimensions(), (43, 128));
}

#[test]
fn test_rerun_creates_no_files() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, TeamsVersion::V1);
    write_image(&config.image_dir.join("x/y/z.gif"), 50, 50);

    let catalog = ImageCatalog::from_config(&config);
    let first = catalog.manifest().unwrap();
    let thumbs_after_first = files_under(&config.thumbnail_dir);

    let second = catalog.manifest().unwrap();

    assert_eq!(first, second);
    assert_eq!(files_under(&config.thumbnail_dir), thumbs_after_first);
    assert_eq!(catalog.thumbnails().generated(), 1);
}

#[test]
fn test_thumbnail_dir_below_image_dir_is_not_cataloged() {
    let dir = TempDir::new().unwrap();
    let image_dir = dir.path().join("bg");
    let config = Config {
        thumbnail_dir: image_dir.join("thumbs"),
        image_dir,
        thumbnail_size: ThumbnailSize::new(32, 32),
        ..Config::default()
    };
    fs::create_dir_all(&config.thumbnail_dir).unwrap();
    write_image(&config.image_dir.join("a.png"), 64, 64);

    let catalog = ImageCatalog::from_config(&config);
    for _ in 0..3 {
        let manifest = catalog.manifest().unwrap();
        assert_eq!(manifest.len(), 1);
        assert!(manifest.entries()[0].src.ends_with("/images/a.png"));
    }

    assert_eq!(catalog.thumbnails().generated(), 1);
    assert_eq!(files_under(&config.thumbnail_dir), vec![PathBuf::from("a.png")]);
}

#[test]
fn test_thumbnails_respect_bounding_box() {
    let dir = TempDir::new().unwrap();
    let mut config = config(&dir, TeamsVersion::V2);
    config.thumbnail_size = ThumbnailSize::new(100, 40);

    let cases = [
        ((1000, 1000), (40, 40)),
        ((37, 901), (2, 40)),
        ((800, 20), (100, 3)),
        ((30, 10), (30, 10)),
    ];
    for (i, ((w, h), _)) in cases.iter().enumerate() {
        write_image(&config.image_dir.join(format!("img{i}.png")), *w, *h);
    }

    ImageCatalog::from_config(&config).list().unwrap();

    for (i, (_, expected)) in cases.iter().enumerate() {
        let thumb = image::open(config.thumbnail_dir.join(format!("img{i}.png"))).unwrap();
        assert_eq!(thumb.dimensions(), *expected, "img{i}");
    }
}

#[test]
fn test_nested_albums_get_mirrored_thumbnail_dirs() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, TeamsVersion::V2);
    write_image(&config.image_dir.join("one/two/deep.png"), 20, 20);
    write_image(&config.image_dir.join("one/top.png"), 20, 20);

    let entries = ImageCatalog::from_config(&config).list().unwrap();

    assert_eq!(entries.len(), 2);
    assert_eq!(
        files_under(&config.thumbnail_dir),
        vec![PathBuf::from("one/top.png"), PathBuf::from("one/two/deep.png")]
    );
}

#[test]
fn test_failure_aborts_listing() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, TeamsVersion::V2);
    fs::write(config.image_dir.join("bad.jpg"), b"nope").unwrap();

    let err = ImageCatalog::from_config(&config).list().unwrap_err();
    assert!(matches!(err, CatalogError::Thumbnail(_)));
}
