//! JSON persistence for the user config.

use shared::settings::Config;
use shared::FixError;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.fixai/config.json`
    pub fn default_location() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(".fixai").join("config.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the config. A missing file is an empty config.
    pub fn load(&self) -> Result<Config, FixError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no config file yet");
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(FixError::ConfigIo {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| FixError::ConfigCorrupt {
            path: self.path.clone(),
            message: e.to_string(),
        })
    }

    /// Write the config, replacing the file in one rename.
    pub fn save(&self, config: &Config) -> Result<(), FixError> {
        let io_err = |source| FixError::ConfigIo {
            path: self.path.clone(),
            source,
        };
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(io_err)?;

        let json = serde_json::to_vec_pretty(config)
            .map_err(|e| io_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(&json).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        tracing::info!(path = %self.path.display(), "config saved");
        Ok(())
    }
}
