//! Configuration structures and loading.

use crate::error::{ConfigError, ConfigResult};
use crate::paths::AppPaths;
use quarry_core::RagSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub fetch: FetchConfig,

    #[serde(default)]
    pub media: MediaConfig,

    #[serde(default)]
    pub github: GithubConfig,
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> ConfigResult<Self> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Self::load_from(&paths.config_file)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Create a default config file with comments.
    pub fn create_default_file(path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::default_config_string())?;
        Ok(())
    }

    /// Check values that would only fail later, mid-batch.
    pub fn validate(&self) -> ConfigResult<()> {
        self.ingest
            .rag_settings()
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("[ingest] {}", e)))?;

        if self.fetch.timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "[fetch] timeout_seconds must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Resolve application paths, honouring `general.data_dir`.
    pub fn paths(&self) -> ConfigResult<AppPaths> {
        let paths = AppPaths::new().ok_or(ConfigError::NoConfigDir)?;
        Ok(match &self.general.data_dir {
            Some(dir) => paths.relocate_data(PathBuf::from(dir)),
            None => paths,
        })
    }

    /// Generate a default config file with helpful comments.
    pub fn default_config_string() -> String {
        r#"# Quarry Configuration

[general]
# Directory for the database and temporary work files
# data_dir = "~/.local/share/quarry"

[ingest]
# Seed values for the tenant-wide chunking settings.
# Written to the database by `quarry init`; change them later with
# `quarry settings set`.
chunk_size = 1000
chunk_overlap = 200
use_headless_fetch = false

[fetch]
timeout_seconds = 30
user_agent = "quarry/0.1"
# Headless browser used when headless fetch is enabled
browser = "chromium"
max_crawl_pages = 25
max_sitemap_pages = 100

[media]
# Whisper model size: tiny, base, small, medium, large
whisper_model = "base"
language = "en"

[github]
# Default token for private repositories
# token = "ghp_..."
"#
        .to_string()
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    pub data_dir: Option<String>,
}

/// Seed values for the tenant ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub use_headless_fetch: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        let defaults = RagSettings::default();
        Self {
            chunk_size: defaults.chunk_size,
            chunk_overlap: defaults.chunk_overlap,
            use_headless_fetch: defaults.use_headless_fetch,
        }
    }
}

impl IngestConfig {
    pub fn rag_settings(&self) -> RagSettings {
        RagSettings::new(self.chunk_size, self.chunk_overlap, self.use_headless_fetch)
    }
}

/// Network fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub browser: String,
    pub max_crawl_pages: usize,
    pub max_sitemap_pages: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: "quarry/0.1".to_string(),
            browser: "chromium".to_string(),
            max_crawl_pages: 25,
            max_sitemap_pages: 100,
        }
    }
}

/// Audio and video transcription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaConfig {
    pub whisper_model: String,
    pub language: String,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            whisper_model: "base".to_string(),
            language: "en".to_string(),
        }
    }
}

/// GitHub access settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    pub token: Option<String>,
}
