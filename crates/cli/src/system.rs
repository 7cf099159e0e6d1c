//! A validated set of packages plus the connections between them.

use crate::config::{Config, ConnectionConfig};
use crate::error::{Error, Result};
use interfaces::{CompileInput, ConnectedPlug, ConnectedSlot, Connection, PackageInfo, Registry};
use std::collections::BTreeSet;

#[derive(Debug)]
pub struct System {
    packages: Vec<PackageInfo>,
    connections: Vec<ConnectionConfig>,
}

impl System {
    /// Loads and validates every package listed in `config`.
    pub fn load(config: &Config, registry: &Registry) -> Result<Self> {
        let mut packages = Vec::with_capacity(config.packages.len());
        for path in config.package_paths() {
            let info = PackageInfo::load(&path)
                .and_then(|info| registry.sanitize_package(&info).map(|()| info))
                .map_err(|source| Error::Package {
                    path: path.clone(),
                    source,
                })?;
            tracing::info!(package = info.name(), path = %path.display(), "package loaded");
            packages.push(info);
        }
        Self::new(packages, config.connections.clone())
    }

    /// Assembles a system from already validated packages.
    pub fn new(packages: Vec<PackageInfo>, connections: Vec<ConnectionConfig>) -> Result<Self> {
        let mut names = BTreeSet::new();
        for package in &packages {
            if !names.insert(package.name()) {
                return Err(Error::DuplicatePackage {
                    name: package.name().to_string(),
                });
            }
        }
        Ok(Self {
            packages,
            connections,
        })
    }

    pub fn packages(&self) -> &[PackageInfo] {
        &self.packages
    }

    /// Every declaration as a permanent contribution, plus each configured
    /// connection bound to its plug and slot.
    pub fn compile_input(&self) -> Result<CompileInput<'_>> {
        let mut input = CompileInput::from_packages(&self.packages);
        for conn in &self.connections {
            let plug = self
                .package(&conn.plug.package)?
                .plug(&conn.plug.name)
                .ok_or_else(|| Error::UnknownPlug {
                    package: conn.plug.package.clone(),
                    plug: conn.plug.name.clone(),
                })?;
            let slot = self
                .package(&conn.slot.package)?
                .slot(&conn.slot.name)
                .ok_or_else(|| Error::UnknownSlot {
                    package: conn.slot.package.clone(),
                    slot: conn.slot.name.clone(),
                })?;
            let connection = Connection::new(
                ConnectedPlug::new(plug, conn.plug_attrs.clone()),
                ConnectedSlot::new(slot, conn.slot_attrs.clone()),
            )?;
            tracing::debug!(plug = %conn.plug, slot = %conn.slot, "connection bound");
            input.connections.push(connection);
        }
        Ok(input)
    }

    fn package(&self, name: &str) -> Result<&PackageInfo> {
        self.packages
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| Error::UnknownPackage {
                name: name.to_string(),
            })
    }
}
