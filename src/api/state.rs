use std::sync::Arc;

use crate::catalog::ImageCatalog;
use crate::config::Config;
use crate::observability::Metrics;
use crate::resolver::PathResolver;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<ImageCatalog>,
    pub images: Arc<PathResolver>,
    pub thumbnails: Arc<PathResolver>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let catalog = ImageCatalog::from_config(&config);
        let images = PathResolver::new(&config.image_dir);
        let thumbnails = PathResolver::new(&config.thumbnail_dir);

        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            images: Arc::new(images),
            thumbnails: Arc::new(thumbnails),
            metrics: Arc::new(Metrics::new()),
        }
    }
}
