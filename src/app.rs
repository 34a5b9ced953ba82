//! Installation run: settings, game lookup, DLC list, then the DLL swap

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::{CatalogClient, CatalogError};
use crate::config::{ConfigError, Settings};
use crate::cream_ini;
use crate::game_finder::{resolve_game_folder, GameFolder};
use crate::installer::{SwapEngine, SwapOptions, SwapReport, STEAM_API64_DLL, STEAM_API_DLL};
use crate::logging::log_info;

// ============================================================================
// Types
// ============================================================================

/// Everything one run needs
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub app_id: u32,
    pub options: SwapOptions,
    pub settings_path: PathBuf,
    pub catalog: CatalogClient,
}

impl RunRequest {
    pub fn new(app_id: u32, options: SwapOptions) -> Self {
        Self {
            app_id,
            options,
            settings_path: Settings::default_path(),
            catalog: CatalogClient::new(),
        }
    }
}

#[derive(Debug)]
pub struct RunSummary {
    pub game: GameFolder,
    pub report: SwapReport,
}

/// Failures that stop the whole run, before any DLL is touched
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Missing {x86} and {x64}")]
    MissingDlls { x86: PathBuf, x64: PathBuf },

    #[error("No game folder for appid {0} found in paths")]
    GameNotFound(u32),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl RunError {
    /// Process exit status for scripts. 1 and 2 belong to clap usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            RunError::Config(_) => 3,
            RunError::MissingDlls { .. } => 4,
            RunError::GameNotFound(_) => 5,
            RunError::Catalog(_) => 6,
        }
    }
}

// ============================================================================
// Run
// ============================================================================

pub fn run(request: &RunRequest) -> Result<RunSummary, RunError> {
    let options = &request.options;
    log_info(&format!("AppID: {}", request.app_id));
    if options.mock {
        log_info("Running in mock mode");
    }
    if options.only_update {
        log_info("Only updating cream_api.ini");
    }
    if options.force {
        log_info("Force mode");
    }

    let settings = Settings::load_or_create(&request.settings_path, options.mock)?;

    // Which of the two is needed is only known per DLL, so one is enough here
    let dll_folder = settings.dll_folder(&request.settings_path);
    let x86 = dll_folder.join(STEAM_API_DLL);
    let x64 = dll_folder.join(STEAM_API64_DLL);
    if !x86.is_file() && !x64.is_file() {
        return Err(RunError::MissingDlls { x86, x64 });
    }

    let game = resolve_game_folder(&settings.library_roots(), request.app_id)
        .ok_or(RunError::GameNotFound(request.app_id))?;
    log_info(&format!("Game Path: {}", game.path.display()));

    let dlcs = request.catalog.fetch_dlcs(request.app_id)?;
    let rendered = cream_ini::render(request.app_id, &dlcs);

    let report = SwapEngine::new(dll_folder, *options).run(&game.path, &rendered);
    log_info("Done.");

    Ok(RunSummary { game, report })
}
