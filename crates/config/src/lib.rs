//! Configuration loading and validation for metafinder.
//!
//! Settings are merged from three layers, later layers winning:
//! built-in defaults, then a `metafinder.{toml,yaml,json}` file in the
//! working directory, then `METAFINDER_*` environment variables.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const ENV_PREFIX: &str = "METAFINDER_";
const FILE_STEM: &str = "metafinder";
const DEFAULT_BATCH_SIZE: usize = 100;

/// Settings for an embedding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Location of the SQLite metadata database.
    pub database: PathBuf,
    /// Files per extraction subprocess invocation.
    pub batch_size: usize,
    /// Explicit path to the exiftool binary; `None` searches `$PATH`.
    pub exiftool: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self { database: default_database_path(), batch_size: DEFAULT_BATCH_SIZE, exiftool: None }
    }
}

impl Config {
    /// Load configuration from the working directory and environment.
    pub fn load() -> Result<Self> {
        Self::extract(Self::figment(Path::new(".")))
    }

    /// Load configuration with the file layer read from `dir` instead of
    /// the working directory.
    pub fn load_from(dir: impl AsRef<Path>) -> Result<Self> {
        Self::extract(Self::figment(dir.as_ref()))
    }

    fn figment(dir: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(dir.join(format!("{FILE_STEM}.toml"))))
            .merge(Yaml::file(dir.join(format!("{FILE_STEM}.yaml"))))
            .merge(Json::file(dir.join(format!("{FILE_STEM}.json"))))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        debug!(database = %config.database.display(), batch_size = config.batch_size, "configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            exn::bail!(ErrorKind::Invalid("batch size must be at least one"));
        }
        Ok(())
    }
}

/// Platform data directory, falling back to the working directory when the
/// platform gives us nothing (e.g. no `$HOME`).
fn default_database_path() -> PathBuf {
    ProjectDirs::from("", "", FILE_STEM)
        .map(|dirs| dirs.data_dir().join("metafinder.db"))
        .unwrap_or_else(|| PathBuf::from("metafinder.db"))
}
