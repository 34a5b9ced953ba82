//! Game detection module
//!
//! Resolves a Steam App ID to its install folder across the configured
//! library roots.
//!
//! # Example
//!
//! ```rust,ignore
//! use creamdeck::game_finder::resolve_game_folder;
//!
//! let roots = ["/home/deck/.local/share/Steam", "/run/media/mmcblk0p1"];
//! if let Some(game) = resolve_game_folder(&roots, 480) {
//!     println!("Found: {}", game.path.display());
//! }
//! ```

mod steam;
pub mod vdf;

pub use steam::{find_in_library, resolve_game_folder, GameFolder, LibraryMiss};
pub use vdf::{AppManifest, ManifestError};
