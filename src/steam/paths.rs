//! Steam library path detection
//!
//! Provides the default list of library roots written into a fresh
//! settings file.

use std::path::{Path, PathBuf};

// ============================================================================
// Default Library Roots
// ============================================================================

/// Steam Deck SD card mount point
const STEAM_DECK_SD_CARD: &str = "/run/media/mmcblk0p1";

/// Library locations relative to the home directory on Linux
const LINUX_STEAM_PATHS: &[&str] = &[
    ".local/share/Steam",
    ".steam/steam",
    ".var/app/com.valvesoftware.Steam/.local/share/Steam",
];

const WINDOWS_STEAM_PATHS: &[&str] = &["C:\\Program Files (x86)\\Steam", "C:\\Program Files\\Steam"];

/// Candidate library roots for the running platform.
///
/// Resolved at runtime from the OS name and home directory. The list is
/// ordered by preference and is not filtered for existence, so it can be
/// written to a settings file on a machine where some roots appear later
/// (an SD card, for instance).
#[must_use]
pub fn default_library_roots() -> Vec<String> {
    library_roots_for(std::env::consts::OS, dirs::home_dir().as_deref())
}

/// Candidate library roots for an explicit OS name and home directory
pub fn library_roots_for(os: &str, home: Option<&Path>) -> Vec<String> {
    match os {
        "windows" => WINDOWS_STEAM_PATHS.iter().map(|p| p.to_string()).collect(),
        "macos" => home
            .map(|h| h.join("Library/Application Support/Steam"))
            .into_iter()
            .map(path_to_string)
            .collect(),
        _ => {
            let mut roots: Vec<String> = home
                .map(|h| {
                    LINUX_STEAM_PATHS
                        .iter()
                        .map(|rel| path_to_string(h.join(rel)))
                        .collect()
                })
                .unwrap_or_default();
            roots.push(STEAM_DECK_SD_CARD.to_string());
            roots
        }
    }
}

fn path_to_string(path: PathBuf) -> String {
    path.to_string_lossy().to_string()
}
