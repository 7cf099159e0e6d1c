//! systemd unit definitions.

use super::{Backend, Scoped, Scope, Specification, TagSet, with_scope};
use crate::connection::{ConnectedPlug, ConnectedSlot};
use crate::interface::Interface;
use crate::package::{PlugInfo, SlotInfo};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How systemd decides a service has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    #[default]
    Simple,
    Oneshot,
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceType::Simple => f.write_str("simple"),
            ServiceType::Oneshot => f.write_str("oneshot"),
        }
    }
}

/// A service unit requested by an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Service {
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub remain_after_exit: bool,
    pub exec_start: String,
    pub exec_stop: String,
}

/// Unit name for an interface-owned service of a package.
///
/// `unique` must be stable for the same attribute value so that repeated
/// compilation addresses the same unit.
pub fn interface_service_name(package: &str, unique: &str) -> String {
    format!("snap.{package}.interface.{unique}.service")
}

/// Accumulated service units, keyed by unit name.
#[derive(Debug, Clone, Default)]
pub struct SystemdSpec {
    scope: Scope,
    services: BTreeMap<String, Service>,
    tags: TagSet,
}

impl SystemdSpec {
    /// Adds a unit. Re-adding an identical unit is a no-op; a different
    /// unit under an existing name is an error.
    pub fn add_service(&mut self, name: impl Into<String>, service: Service) -> Result<()> {
        let name = name.into();
        if let Some(existing) = self.services.get(&name) {
            if *existing != service {
                return Err(Error::ConflictingService {
                    interface: self.scope.interface.clone(),
                    service: name,
                });
            }
        } else {
            self.services.insert(name, service);
        }
        self.tags.extend(&self.scope.tags);
        Ok(())
    }

    pub fn services(&self) -> &BTreeMap<String, Service> {
        &self.services
    }
}

impl Scoped for SystemdSpec {
    fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

impl Specification for SystemdSpec {
    const BACKEND: Backend = Backend::Systemd;

    fn add_connected_plug(
        &mut self,
        iface: &dyn Interface,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        with_scope(self, iface, plug.security_tags(), |spec| {
            iface.systemd_connected_plug(spec, plug, slot)
        })
    }

    fn add_connected_slot(
        &mut self,
        iface: &dyn Interface,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        with_scope(self, iface, slot.security_tags(), |spec| {
            iface.systemd_connected_slot(spec, plug, slot)
        })
    }

    fn add_permanent_plug(&mut self, iface: &dyn Interface, plug: &PlugInfo) -> Result<()> {
        with_scope(self, iface, plug.security_tags(), |spec| {
            iface.systemd_permanent_plug(spec, plug)
        })
    }

    fn add_permanent_slot(&mut self, iface: &dyn Interface, slot: &SlotInfo) -> Result<()> {
        with_scope(self, iface, slot.security_tags(), |spec| {
            iface.systemd_permanent_slot(spec, slot)
        })
    }

    fn security_tags(&self) -> Vec<String> {
        self.tags.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oneshot(cmd: &str) -> Service {
        Service {
            service_type: ServiceType::Oneshot,
            remain_after_exit: true,
            exec_start: cmd.to_string(),
            exec_stop: String::new(),
        }
    }

    #[test]
    fn test_same_service_twice_is_idempotent() {
        let mut spec = SystemdSpec::default();
        spec.add_service("snap.a.interface.x.service", oneshot("true"))
            .unwrap();
        spec.add_service("snap.a.interface.x.service", oneshot("true"))
            .unwrap();
        assert_eq!(spec.services().len(), 1);
    }

    #[test]
    fn test_conflicting_service_is_rejected() {
        let mut spec = SystemdSpec::default();
        spec.add_service("snap.a.interface.x.service", oneshot("true"))
            .unwrap();
        let err = spec
            .add_service("snap.a.interface.x.service", oneshot("false"))
            .unwrap_err();
        assert!(matches!(err, Error::ConflictingService { .. }));
    }

    #[test]
    fn test_service_name() {
        assert_eq!(
            interface_service_name("my-device", "gpio-100"),
            "snap.my-device.interface.gpio-100.service"
        );
    }

    #[test]
    fn test_service_serializes_kebab_case() {
        let json = serde_json::to_value(oneshot("true")).unwrap();
        assert_eq!(json["type"], "oneshot");
        assert_eq!(json["remain-after-exit"], true);
        assert_eq!(json["exec-start"], "true");
    }
}
