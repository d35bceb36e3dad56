//! # ECS Configuration
//!
//! Loaded once at startup from TOML. Every key is optional.
//!
//! ```toml
//! initial_capacity = 4096
//! trace_lifecycle = false
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{EcsError, EcsResult};

/// Default number of entity slots reserved up front.
pub const DEFAULT_INITIAL_CAPACITY: usize = 1024;

/// Tunables for an [`Ecs`](crate::Ecs) instance.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcsConfig {
    /// Entity slots reserved in the allocator, flag sets and every component
    /// table before the first `create()`.
    pub initial_capacity: usize,
    /// Emit a `trace` event for every create, destroy, attach and detach.
    pub trace_lifecycle: bool,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            trace_lifecycle: false,
        }
    }
}

impl EcsConfig {
    /// Parses a configuration from TOML source.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Config`] on malformed TOML, unknown keys or
    /// mistyped values.
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        toml::from_str(source).map_err(|e| EcsError::Config(e.to_string()))
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> EcsResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EcsError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }
}
