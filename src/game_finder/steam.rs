//! Steam game folder resolution
//!
//! Locates a game's install folder by reading its appmanifest_<id>.acf from
//! each configured library root in turn.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::vdf::{AppManifest, ManifestError};
use crate::logging::{log_info, log_warning};

/// A resolved game installation
#[derive(Debug, Clone)]
pub struct GameFolder {
    /// Absolute path to `steamapps/common/<installdir>`
    pub path: PathBuf,
    /// The library root it was found in
    pub library_root: PathBuf,
    pub manifest: AppManifest,
}

/// Why a library root does not contain the requested game
#[derive(Debug, Error)]
pub enum LibraryMiss {
    #[error("missing steamapps folder {0}")]
    MissingSteamApps(PathBuf),

    #[error("missing appmanifest {0}")]
    MissingManifest(PathBuf),

    #[error("invalid appmanifest {path}: {source}")]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },

    #[error("missing game directory {0}")]
    MissingInstallDir(PathBuf),
}

/// Check a single library root for `app_id`
pub fn find_in_library(library_root: &Path, app_id: u32) -> Result<GameFolder, LibraryMiss> {
    let steamapps = library_root.join("steamapps");
    if !steamapps.is_dir() {
        return Err(LibraryMiss::MissingSteamApps(steamapps));
    }

    let manifest_path = steamapps.join(format!("appmanifest_{}.acf", app_id));
    if !manifest_path.is_file() {
        return Err(LibraryMiss::MissingManifest(manifest_path));
    }

    let manifest = AppManifest::read(&manifest_path).map_err(|source| {
        LibraryMiss::InvalidManifest {
            path: manifest_path.clone(),
            source,
        }
    })?;

    let path = steamapps.join("common").join(&manifest.install_dir);
    if !path.is_dir() {
        return Err(LibraryMiss::MissingInstallDir(path));
    }

    Ok(GameFolder {
        path,
        library_root: library_root.to_path_buf(),
        manifest,
    })
}

/// Find the install folder for `app_id` in the first library root that has it.
///
/// Roots are checked in order and the scan stops at the first hit. A root
/// that does not qualify is logged and skipped, never treated as fatal.
pub fn resolve_game_folder<P: AsRef<Path>>(library_roots: &[P], app_id: u32) -> Option<GameFolder> {
    library_roots.iter().find_map(|root| {
        let root = root.as_ref();
        log_info(&format!("Checking for AppID {} in {}...", app_id, root.display()));

        match find_in_library(root, app_id) {
            Ok(folder) => {
                log_info(&format!(
                    "Found {} at {}",
                    folder.manifest.name.as_deref().unwrap_or(&folder.manifest.install_dir),
                    folder.path.display()
                ));
                Some(folder)
            }
            Err(miss) => {
                log_warning(&miss.to_string());
                None
            }
        }
    })
}
