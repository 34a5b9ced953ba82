//! Discovery of the steam_api DLLs inside a game folder

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::logging::log_warning;

pub const STEAM_API_DLL: &str = "steam_api.dll";
pub const STEAM_API64_DLL: &str = "steam_api64.dll";

/// Suffix inserted before `.dll` for the preserved original
pub const BACKUP_SUFFIX: &str = "_o.dll";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    X86,
    X64,
}

impl Architecture {
    /// Architecture of a steam_api file name, `None` for anything else
    pub fn from_file_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case(STEAM_API_DLL) {
            Some(Architecture::X86)
        } else if name.eq_ignore_ascii_case(STEAM_API64_DLL) {
            Some(Architecture::X64)
        } else {
            None
        }
    }

    /// File name of the replacement DLL in the asset folder
    pub fn source_file_name(&self) -> &'static str {
        match self {
            Architecture::X86 => STEAM_API_DLL,
            Architecture::X64 => STEAM_API64_DLL,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Architecture::X86 => "x86",
            Architecture::X64 => "x64",
        }
    }
}

/// A steam_api DLL found under the game folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryCandidate {
    pub path: PathBuf,
    pub architecture: Architecture,
    /// `<name>_o.dll` next to `path`
    pub backup_path: PathBuf,
    /// Replacement DLL in the asset folder
    pub replacement_source: PathBuf,
}

impl BinaryCandidate {
    pub fn new(path: PathBuf, architecture: Architecture, dll_folder: &Path) -> Self {
        let backup_path = backup_path_for(&path);
        let replacement_source = dll_folder.join(architecture.source_file_name());
        Self {
            path,
            architecture,
            backup_path,
            replacement_source,
        }
    }

    /// Folder the DLL lives in, where cream_api.ini is written
    pub fn folder(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// `steam_api64.dll` -> `steam_api64_o.dll`, keeping the stem's casing
pub fn backup_path_for(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    path.with_file_name(format!("{}{}", stem, BACKUP_SUFFIX))
}

/// Walk `game_folder` for steam_api.dll / steam_api64.dll.
///
/// Names are matched case-insensitively and anything else that merely starts
/// with `steam_api` (including our own `_o.dll` backups) is ignored.
/// Unreadable directories are logged and skipped.
pub fn find_candidates(game_folder: &Path, dll_folder: &Path) -> Vec<BinaryCandidate> {
    let mut candidates = Vec::new();

    let walker = WalkDir::new(game_folder)
        .follow_links(false)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log_warning(&format!("Skipping unreadable path: {}", e));
                continue;
            }
        };

        // Symlinked DLLs count; the swap renames the link itself to the backup
        if !entry.path().is_file() {
            continue;
        }

        let Some(architecture) = entry
            .file_name()
            .to_str()
            .and_then(Architecture::from_file_name)
        else {
            continue;
        };

        candidates.push(BinaryCandidate::new(
            entry.into_path(),
            architecture,
            dll_folder,
        ));
    }

    candidates
}
