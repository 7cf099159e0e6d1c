//! CLI error types.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// CLI errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A package manifest could not be loaded or was rejected.
    #[error("{}: {source}", path.display())]
    Package {
        path: PathBuf,
        #[source]
        source: interfaces::Error,
    },

    /// Two manifests declare the same package name.
    #[error("package {name:?} is listed more than once")]
    DuplicatePackage { name: String },

    /// A connection names a package that is not loaded.
    #[error("unknown package {name:?}")]
    UnknownPackage { name: String },

    /// A connection names a plug its package does not declare.
    #[error("package {package:?} has no plug {plug:?}")]
    UnknownPlug { package: String, plug: String },

    /// A connection names a slot its package does not declare.
    #[error("package {package:?} has no slot {slot:?}")]
    UnknownSlot { package: String, slot: String },

    /// Some manifests failed validation.
    #[error("{failed} of {total} manifests failed validation")]
    ValidationFailed { failed: usize, total: usize },

    /// Configuration is invalid or missing required fields.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred in the interfaces layer.
    #[error(transparent)]
    Interfaces(#[from] interfaces::Error),

    /// Output could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
