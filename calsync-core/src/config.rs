//! Engine configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Local, Offset};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_PROVIDER, DEFAULT_PROVIDER_TIMEOUT_SECS, DEFAULT_WINDOW_PADDING_DAYS,
    SYNC_TOKENS_FILE,
};
use crate::date_range::{DateRangeResolver, ViewMode};
use crate::error::{CalSyncError, CalSyncResult};
use crate::remote::Provider;

static DEFAULT_STATE_DIR: &str = "~/.local/state/calsync";

fn default_state_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_DIR)
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_padding_days() -> i64 {
    DEFAULT_WINDOW_PADDING_DAYS
}

fn default_timeout_secs() -> u64 {
    DEFAULT_PROVIDER_TIMEOUT_SECS
}

/// Configuration at ~/.config/calsync/config.toml, overridable with `CALSYNC_*`
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Provider binary suffix: `google` runs `calsync-provider-google`.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Where the sync token map is kept between runs.
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,

    #[serde(default)]
    pub default_view: ViewMode,

    #[serde(default = "default_padding_days")]
    pub window_padding_days: i64,

    #[serde(default = "default_timeout_secs")]
    pub provider_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            provider: default_provider(),
            state_dir: default_state_dir(),
            default_view: ViewMode::default(),
            window_padding_days: default_padding_days(),
            provider_timeout_secs: default_timeout_secs(),
        }
    }
}

impl EngineConfig {
    pub fn config_path() -> CalSyncResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalSyncError::Config("Could not determine config directory".into()))?
            .join("calsync");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, creating a commented template on first run.
    pub fn load() -> CalSyncResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> CalSyncResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("CALSYNC"))
            .build()
            .map_err(|e| CalSyncError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalSyncError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalSyncResult<()> {
        let contents = format!(
            "\
# calsync configuration

# Provider binary to talk to (calsync-provider-<name> on PATH):
# provider = \"{}\"

# Where sync tokens are kept between runs:
# state_dir = \"{}\"

# View used when none is given (day, 3days, workweek, week, 2weeks, month):
# default_view = \"week\"

# Days fetched beyond each edge of the visible range (0 to 366):
# window_padding_days = {}

# Seconds to wait for the provider:
# provider_timeout_secs = {}
",
            DEFAULT_PROVIDER,
            DEFAULT_STATE_DIR,
            DEFAULT_WINDOW_PADDING_DAYS,
            DEFAULT_PROVIDER_TIMEOUT_SECS
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalSyncError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalSyncError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn state_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.state_dir.to_string_lossy()).into_owned())
    }

    pub fn token_store_path(&self) -> PathBuf {
        self.state_path().join(SYNC_TOKENS_FILE)
    }

    /// Resolver computing day boundaries in the machine's local offset.
    pub fn resolver(&self) -> DateRangeResolver {
        DateRangeResolver::new(self.window_padding_days, Local::now().offset().fix())
    }

    pub fn provider(&self) -> Provider {
        Provider::from_name(&self.provider)
            .with_timeout(Duration::from_secs(self.provider_timeout_secs))
    }
}
