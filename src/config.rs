use anyhow::{bail, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Fleet
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FleetConfig {
    /// Where records are stored
    pub store: StoreConfig,
    /// Captured image handling
    pub images: ImageConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON file on the local disk
    Local,
    /// Remote realtime database over REST
    Realtime,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Database file for the local backend
    pub local_path: PathBuf,
    /// Base URL of the realtime database (can be set via env var)
    pub database_url: Option<String>,
    /// Auth token appended to realtime requests
    pub auth_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageConfig {
    /// Application-local directory for captured photos
    pub directory: PathBuf,
    /// Target width after normalization
    pub width: u32,
    /// Target height after normalization
    pub height: u32,
    /// JPEG quality, 1-100
    pub quality: u8,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub json: bool,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                backend: StoreBackend::Local,
                local_path: PathBuf::from(".fleet/database.json"),
                database_url: None,
                auth_token: None,
            },
            images: ImageConfig {
                directory: PathBuf::from(".fleet/images"),
                width: 1024,
                height: 768, // 4:3, as framed by the camera
                quality: 70,
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json: false,
            },
        }
    }
}

impl FleetConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (fleet.toml, .fleet-rc)
    /// 3. Environment variables (prefixed with FLEET__, e.g. FLEET__STORE__BACKEND)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`FleetConfig::load`] with configuration files looked up in `dir`.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&FleetConfig::default())?);

        let toml_file = dir.join("fleet.toml");
        if toml_file.exists() {
            builder = builder.add_source(File::from(toml_file));
        }

        let rc_file = dir.join(".fleet-rc");
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("FLEET")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut fleet_config: FleetConfig = builder.build()?.try_deserialize()?;

        // The mobile app's variable is honored when no URL was configured.
        if fleet_config.store.database_url.is_none() {
            if let Ok(url) = std::env::var("EXPO_PUBLIC_FIREBASE_DATABASE_URL") {
                fleet_config.store.database_url = Some(url);
            }
        }

        fleet_config.validate()?;
        Ok(fleet_config)
    }

    /// Reject settings that would make every capture fail.
    pub fn validate(&self) -> Result<()> {
        let images = &self.images;
        if images.width == 0 || images.height == 0 {
            bail!(
                "images.width and images.height must be positive, got {}x{}",
                images.width,
                images.height
            );
        }
        if !(1..=100).contains(&images.quality) {
            bail!("images.quality must be between 1 and 100, got {}", images.quality);
        }
        Ok(())
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}
