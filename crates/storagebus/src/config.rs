//! TOML configuration for building a [`Storage`].
//!
//! Configuration is loaded with precedence:
//! - Bundled defaults (include_str! from storagebus.toml)
//! - User config in the home directory (~/.config/storagebus/storagebus.toml)
//! - User config in the current directory (./storagebus.toml)

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use storagebus_cloud::{GcsOptions, ObjectStoreDriver, S3Options};
use storagebus_error::{ConfigError, StorageBusError, StorageBusResult};
use storagebus_local::LocalDriver;
use storagebus_storage::{
    DEFAULT_SEPARATOR, Driver, DriverKind, MemoryDriver, Storage, StorageOptions,
    StorageOptionsBuilder,
};
use tracing::{debug, instrument};

/// Backend selection, tagged by `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DriverConfig {
    /// Process-local map
    #[default]
    Memory,
    /// Files below `root`
    Local {
        /// Root directory, created if missing
        root: PathBuf,
    },
    /// S3-compatible bucket
    S3(S3Options),
    /// Google Cloud Storage bucket
    Gcs(GcsOptions),
}

impl DriverConfig {
    /// Backend this configuration selects.
    pub fn kind(&self) -> DriverKind {
        match self {
            DriverConfig::Memory => DriverKind::Memory,
            DriverConfig::Local { .. } => DriverKind::Local,
            DriverConfig::S3(_) => DriverKind::S3,
            DriverConfig::Gcs(_) => DriverKind::Gcs,
        }
    }
}

/// The `[storage]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageSettings {
    /// Canonicalize keys before they reach the driver
    #[serde(default = "enabled")]
    pub sanitize_key: bool,
    /// Replacement for spaces in sanitized keys
    #[serde(default = "default_separator")]
    pub separator: String,
    /// Infer content types from key extensions
    #[serde(default = "enabled")]
    pub infer_type: bool,
    /// Log absent keys that are reported without failing
    #[serde(default)]
    pub debug: bool,
    /// Backend selection
    #[serde(default)]
    pub driver: DriverConfig,
}

fn enabled() -> bool {
    true
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            sanitize_key: true,
            separator: default_separator(),
            infer_type: true,
            debug: false,
            driver: DriverConfig::default(),
        }
    }
}

/// Top-level storagebus configuration.
///
/// # Example
///
/// ```no_run
/// use storagebus::StorageConfig;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // Bundled defaults + user overrides
/// let storage = StorageConfig::load()?.build()?;
/// storage.write("hello.txt", "hello").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// The `[storage]` table
    #[serde(default)]
    pub storage: StorageSettings,
}

impl StorageConfig {
    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> StorageBusResult<Self> {
        debug!("Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                StorageBusError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                StorageBusError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid configuration.
    pub fn from_toml(toml: &str) -> StorageBusResult<Self> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .and_then(Config::try_deserialize::<Self>)
            .map_err(|e| {
                StorageBusError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be parsed.
    #[instrument]
    pub fn load() -> StorageBusResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../storagebus.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/storagebus/storagebus.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("storagebus").required(false));

        builder
            .build()
            .map_err(|e| {
                StorageBusError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                StorageBusError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Facade options described by the `[storage]` table.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the separator cannot be used.
    pub fn options(&self) -> StorageBusResult<StorageOptions> {
        let settings = &self.storage;
        StorageOptionsBuilder::default()
            .sanitize_key(settings.sanitize_key)
            .separator(settings.separator.clone())
            .infer_type(settings.infer_type)
            .debug(settings.debug)
            .build()
            .map_err(|e| {
                StorageBusError::from(ConfigError::new(format!("storage.separator: {}", e)))
            })
    }

    /// Validate the configuration and build the storage it describes.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unusable separator, an empty
    /// local root or bucket, or settings the cloud client rejects.
    #[instrument(skip(self), fields(kind = %self.storage.driver.kind()))]
    pub fn build(&self) -> StorageBusResult<Storage> {
        let options = self.options()?;

        let driver: Arc<dyn Driver> = match &self.storage.driver {
            DriverConfig::Memory => Arc::new(MemoryDriver::new()),
            DriverConfig::Local { root } => {
                if root.as_os_str().is_empty() {
                    return Err(ConfigError::new("storage.driver.root must not be empty").into());
                }
                Arc::new(LocalDriver::new(root)?)
            }
            DriverConfig::S3(s3) => Arc::new(ObjectStoreDriver::s3(s3)?),
            DriverConfig::Gcs(gcs) => Arc::new(ObjectStoreDriver::gcs(gcs)?),
        };

        debug!(driver = %driver.kind(), "Built storage from configuration");
        Ok(Storage::from_arc(driver, options))
    }
}
