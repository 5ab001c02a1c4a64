use anyhow::{bail, Context, Result};
use fleet::camera::{FileCamera, ImagePipeline, JpegNormalizer};
use fleet::config::{FleetConfig, StoreBackend};
use fleet::fs::StandardFileSystem;
use fleet::store::{DataStore, MemoryStore, RealtimeStore};
use fleet::{RecordService, RentalService, Repository};
use std::path::PathBuf;
use std::sync::Arc;

pub mod clients;
pub mod config;
pub mod motorcycles;
pub mod rentals;

/// Services wired from the effective configuration.
pub struct FleetContext {
    pub records: RecordService,
    pub rentals: RentalService,
}

impl FleetContext {
    /// Build the services. `camera_files` feed the file-backed camera used by `photo`.
    pub async fn build(config: &FleetConfig, camera_files: Vec<PathBuf>) -> Result<Self> {
        let store = open_store(config).await?;
        let repo = Repository::new(store);

        let images = ImagePipeline::new(
            Arc::new(FileCamera::new(camera_files)),
            Arc::new(JpegNormalizer::from(&config.images)),
            Arc::new(StandardFileSystem),
            config.images.directory.clone(),
        );

        Ok(Self {
            records: RecordService::new(repo.clone(), Arc::new(images)),
            rentals: RentalService::new(repo),
        })
    }
}

async fn open_store(config: &FleetConfig) -> Result<Arc<dyn DataStore>> {
    match config.store.backend {
        StoreBackend::Local => {
            let store = MemoryStore::open(&config.store.local_path)
                .await
                .with_context(|| {
                    format!("Failed to open {}", config.store.local_path.display())
                })?;
            Ok(Arc::new(store))
        }
        StoreBackend::Realtime => {
            let Some(url) = config.store.database_url.clone() else {
                bail!("store.database_url is required for the realtime backend");
            };
            Ok(Arc::new(RealtimeStore::new(url, config.store.auth_token.clone())))
        }
    }
}

pub(crate) fn or_dash(value: &str) -> &str {
    if value.trim().is_empty() {
        "-"
    } else {
        value
    }
}
