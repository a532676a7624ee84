//! Configuration file loading helpers

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Load and parse a TOML configuration file into a typed config struct.
///
/// Both the read failure and the parse failure surface as
/// [`Error::Config`] with the offending path in the message, since callers
/// treat them identically (refuse to start with a bad config).
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse TOML {:?}: {}", path, e)))
}
