//! CreamDeck - CreamAPI installer for Steam games
//!
//! Library crate for CreamDeck core functionality, shared with the CLI.
//! The DLC catalog client (and the run built on it) needs the `catalog` feature.

#[macro_use]
pub mod paths;

pub mod config;
pub mod cream_ini;
pub mod game_finder;
pub mod installer;
pub mod logging;
pub mod steam;

#[cfg(feature = "catalog")]
pub mod app;
#[cfg(feature = "catalog")]
pub mod catalog;
