use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logging::{log_info, log_warning};
use crate::steam::default_library_roots;

/// Folder holding the replacement DLLs, relative to the settings file
pub const DEFAULT_DLL_PATH: &str = "dlls";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed writing config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Settings {
    /// Library roots to search, first match wins
    pub steam_libraries: Vec<String>,
    /// Folder with the replacement steam_api.dll / steam_api64.dll
    pub dll_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            steam_libraries: default_library_roots(),
            dll_path: DEFAULT_DLL_PATH.to_string(),
        }
    }
}

impl Settings {
    /// Default location of the settings file
    pub fn default_path() -> PathBuf {
        app_path!("config.json")
    }

    /// Load settings from `path`, creating the file with defaults if it is absent.
    ///
    /// With `mock` set a missing file is not written; the defaults are used
    /// for this run only.
    pub fn load_or_create(path: &Path, mock: bool) -> Result<Self, ConfigError> {
        if !path.exists() {
            log_info("No config file. Creating one...");
            let settings = Self::default();
            if mock {
                log_info(&format!("Mock: would write {}", path.display()));
            } else {
                settings.save(path)?;
            }
            return Ok(settings);
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if settings.steam_libraries.is_empty() {
            log_warning(&format!("{} lists no Steam libraries", path.display()));
        }
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| write_err(e.into()))?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn library_roots(&self) -> Vec<PathBuf> {
        self.steam_libraries.iter().map(PathBuf::from).collect()
    }

    /// The DLL folder, with a relative `DllPath` resolved against the
    /// directory containing the settings file
    pub fn dll_folder(&self, settings_path: &Path) -> PathBuf {
        let dll_path = Path::new(&self.dll_path);
        if dll_path.is_absolute() {
            return dll_path.to_path_buf();
        }
        match settings_path.parent() {
            Some(parent) => parent.join(dll_path),
            None => dll_path.to_path_buf(),
        }
    }
}
