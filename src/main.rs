//! CreamDeck - CreamAPI installer for Steam games
//!
//! Swaps a game's steam_api DLLs for CreamAPI and writes cream_api.ini with
//! the game's DLC list.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use creamdeck::app::{run, RunRequest};
use creamdeck::app_path;
use creamdeck::installer::SwapOptions;
use creamdeck::logging::{init_logger, log_error};

#[derive(Parser, Debug)]
#[command(name = "creamdeck", version, about = "Installs cream api")]
struct Cli {
    /// The AppID of the game.
    #[arg(value_name = "APP_ID")]
    app_id: u32,

    /// Log what would be done without changing any files.
    #[arg(long)]
    mock: bool,

    /// Only update the cream api config.
    #[arg(long = "only-update")]
    only_update: bool,

    /// Force the copy process and ignore old _o.dll files. Do this after you've validated your steam files.
    #[arg(long)]
    force: bool,

    /// Settings file to use instead of the default location.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // A mock run writes nothing, log file included
    if cli.mock {
        init_logger(None);
    } else {
        init_logger(Some(&app_path!("logs")));
    }

    let options = SwapOptions {
        mock: cli.mock,
        only_update: cli.only_update,
        force: cli.force,
    };
    let mut request = RunRequest::new(cli.app_id, options);
    if let Some(config) = cli.config {
        request.settings_path = config;
    }

    match run(&request) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            log_error(&format!("{}. Exiting...", e));
            ExitCode::from(e.exit_code())
        }
    }
}
