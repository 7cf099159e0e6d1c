//! Configuration loading from ifc.toml.
//!
//! ```toml
//! packages = ["gadget.toml", "consumer.toml"]
//! backends = ["apparmor", "systemd"]    # default: all
//!
//! [[connections]]
//! plug = "consumer:gpio"
//! slot = "my-device:pin"
//! slot-attrs = { number = 5 }
//! ```

use interfaces::{Attrs, Backend};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Package manifest paths, relative to the config file.
    #[serde(default)]
    pub packages: Vec<PathBuf>,

    /// Connections to compile.
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,

    /// Backends to compile.
    #[serde(default = "default_backends")]
    pub backends: Vec<Backend>,

    #[serde(skip)]
    base_dir: PathBuf,
}

/// One plug-to-slot connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConnectionConfig {
    pub plug: Endpoint,
    pub slot: Endpoint,

    /// Connection-time attributes of the plug end.
    #[serde(default)]
    pub plug_attrs: Attrs,

    /// Connection-time attributes of the slot end.
    #[serde(default)]
    pub slot_attrs: Attrs,
}

/// A `package:name` reference to a plug or slot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Endpoint {
    pub package: String,
    pub name: String,
}

impl TryFrom<String> for Endpoint {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.split_once(':') {
            Some((package, name)) if !package.is_empty() && !name.is_empty() => Ok(Self {
                package: package.to_string(),
                name: name.to_string(),
            }),
            _ => Err(format!("expected \"package:name\", got {s:?}")),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.package, self.name)
    }
}

fn default_backends() -> Vec<Backend> {
    Backend::ALL.to_vec()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;
        config.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(config)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.backends.is_empty() {
            return Err(ConfigError::NoBackends);
        }
        Ok(config)
    }

    /// Manifest paths resolved against the config file's directory.
    pub fn package_paths(&self) -> Vec<PathBuf> {
        self.packages.iter().map(|p| self.base_dir.join(p)).collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("no backends selected")]
    NoBackends,
}
