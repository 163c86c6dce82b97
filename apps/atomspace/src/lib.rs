//! # atomspace
//!
//! Library half of the AtomSpace command-line driver: configuration loading
//! and JSON atom scripts. The binary in `main.rs` wires these to clap.

pub mod config;
pub mod script;

pub use config::load_config;
pub use script::{LoadedScript, Script};
