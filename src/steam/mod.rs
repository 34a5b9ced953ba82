//! Steam integration module
//!
//! Platform defaults for Steam library locations.

mod paths;

pub use paths::{default_library_roots, library_roots_for};
