//! # Configuration Loading
//!
//! Builds a [`SpaceConfig`] from an optional TOML file, then applies
//! environment overrides:
//!
//! - `ATOMSPACE_MATCH_DEPTH`: comparison depth bound
//! - `ATOMSPACE_MATCH_STEPS`: step budget (`0` or `unbounded` lifts it)
//!
//! ```toml
//! merge = "max_confidence"
//! match_depth = 64
//! match_steps = 100000
//! concept_hops = 0
//! ```

use atomspace_core::primitives::MAX_MATCH_DEPTH;
use atomspace_core::{AtomSpaceError, SpaceConfig};
use std::path::Path;

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

pub const ENV_MATCH_DEPTH: &str = "ATOMSPACE_MATCH_DEPTH";
pub const ENV_MATCH_STEPS: &str = "ATOMSPACE_MATCH_STEPS";

/// Load configuration from `path` (defaults when `None`) and the process
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<SpaceConfig, AtomSpaceError> {
    let base = match path {
        Some(path) => read_config_file(path)?,
        None => SpaceConfig::default(),
    };
    let config = apply_env_overrides(base, |key| std::env::var(key).ok())?;
    config.validate()?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

/// Parse a TOML configuration document.
pub fn parse_config(text: &str) -> Result<SpaceConfig, AtomSpaceError> {
    toml::from_str(text).map_err(|e| AtomSpaceError::Config(format!("Invalid config: {}", e)))
}

fn read_config_file(path: &Path) -> Result<SpaceConfig, AtomSpaceError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AtomSpaceError::IoError(format!("Cannot read config '{}': {}", path.display(), e)))?;
    if metadata.len() > MAX_CONFIG_FILE_SIZE {
        return Err(AtomSpaceError::Config(format!(
            "Config file {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_CONFIG_FILE_SIZE
        )));
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| AtomSpaceError::IoError(format!("Cannot read config '{}': {}", path.display(), e)))?;
    parse_config(&text)
}

/// Apply overrides from `lookup` (normally the process environment).
pub fn apply_env_overrides<F>(mut config: SpaceConfig, lookup: F) -> Result<SpaceConfig, AtomSpaceError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_MATCH_DEPTH) {
        let depth: usize = raw.trim().parse().map_err(|_| {
            AtomSpaceError::Config(format!("{ENV_MATCH_DEPTH} must be an integer, got '{raw}'"))
        })?;
        config.match_depth = depth.min(MAX_MATCH_DEPTH);
    }

    if let Some(raw) = lookup(ENV_MATCH_STEPS) {
        let raw = raw.trim();
        config.match_steps = if raw == "0" || raw.eq_ignore_ascii_case("unbounded") {
            None
        } else {
            Some(raw.parse().map_err(|_| {
                AtomSpaceError::Config(format!("{ENV_MATCH_STEPS} must be an integer, got '{raw}'"))
            })?)
        };
    }

    Ok(config)
}
