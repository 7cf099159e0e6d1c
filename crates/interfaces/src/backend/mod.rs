//! Security backends and their specification accumulators.
//!
//! Each backend owns one accumulator type. Interfaces write into an
//! accumulator through the per-backend hooks on [`Interface`]; the
//! accumulator sets the security-tag scope around every hook call so the
//! interface only states *what* to allow, never *for whom*.

mod apparmor;
mod dbus;
mod seccomp;
mod systemd;
mod udev;

pub use apparmor::{AppArmorSpec, UNCONFINED_PEER, peer_clause};
pub use dbus::DBusSpec;
pub use seccomp::SeccompSpec;
pub use systemd::{Service, ServiceType, SystemdSpec, interface_service_name};
pub use udev::{UDevSpec, udev_tag};

use crate::connection::{ConnectedPlug, ConnectedSlot};
use crate::interface::Interface;
use crate::package::{PlugInfo, SlotInfo};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

/// A policy enforcement backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    AppArmor,
    Seccomp,
    DBus,
    UDev,
    Systemd,
}

impl Backend {
    /// Every backend, in compilation order.
    pub const ALL: [Backend; 5] = [
        Backend::AppArmor,
        Backend::Seccomp,
        Backend::DBus,
        Backend::UDev,
        Backend::Systemd,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Backend::AppArmor => "apparmor",
            Backend::Seccomp => "seccomp",
            Backend::DBus => "dbus",
            Backend::UDev => "udev",
            Backend::Systemd => "systemd",
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|b| b.name() == s)
            .ok_or_else(|| format!("unknown backend {s:?}"))
    }
}

/// Accumulator for one backend during one compile pass.
pub trait Specification: Default {
    const BACKEND: Backend;

    fn add_connected_plug(
        &mut self,
        iface: &dyn Interface,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()>;

    fn add_connected_slot(
        &mut self,
        iface: &dyn Interface,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()>;

    fn add_permanent_plug(&mut self, iface: &dyn Interface, plug: &PlugInfo) -> Result<()>;

    fn add_permanent_slot(&mut self, iface: &dyn Interface, slot: &SlotInfo) -> Result<()>;

    /// Sorted security tags that received at least one contribution.
    fn security_tags(&self) -> Vec<String>;
}

/// Interface name and security tags a contribution applies to.
#[derive(Debug, Clone, Default)]
pub(crate) struct Scope {
    pub interface: String,
    pub tags: Vec<String>,
}

pub(crate) trait Scoped {
    fn scope_mut(&mut self) -> &mut Scope;
}

/// Runs `f` with the given scope installed, clearing it afterwards even if
/// `f` fails.
pub(crate) fn with_scope<S, F>(
    spec: &mut S,
    iface: &dyn Interface,
    tags: Vec<String>,
    f: F,
) -> Result<()>
where
    S: Scoped,
    F: FnOnce(&mut S) -> Result<()>,
{
    *spec.scope_mut() = Scope {
        interface: iface.name().to_string(),
        tags,
    };
    let result = f(spec);
    *spec.scope_mut() = Scope::default();
    if let Err(e) = &result {
        tracing::debug!(interface = iface.name(), error = %e, "contribution failed");
    }
    result
}

/// Snippets grouped by security tag, deduplicated per tag.
#[derive(Debug, Clone, Default)]
pub(crate) struct SnippetMap {
    pub scope: Scope,
    snippets: BTreeMap<String, Vec<String>>,
}

impl SnippetMap {
    /// Adds a snippet to every tag in scope.
    pub fn add(&mut self, snippet: &str) {
        for tag in &self.scope.tags {
            let entry = self.snippets.entry(tag.clone()).or_default();
            if !entry.iter().any(|s| s == snippet) {
                entry.push(snippet.to_string());
            }
        }
    }

    pub fn snippet_for_tag(&self, tag: &str) -> Option<String> {
        self.snippets.get(tag).map(|s| s.join("\n"))
    }

    pub fn security_tags(&self) -> Vec<String> {
        self.snippets.keys().cloned().collect()
    }

    pub fn snippets(&self) -> Vec<(String, String)> {
        self.snippets
            .iter()
            .map(|(tag, s)| (tag.clone(), s.join("\n")))
            .collect()
    }
}

impl Scoped for SnippetMap {
    fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

/// Security tags touched across a set of contributions.
#[derive(Debug, Clone, Default)]
pub(crate) struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn extend(&mut self, tags: &[String]) {
        self.0.extend(tags.iter().cloned());
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names_round_trip() {
        for backend in Backend::ALL {
            assert_eq!(backend.name().parse::<Backend>(), Ok(backend));
        }
        assert!("selinux".parse::<Backend>().is_err());
    }

    #[test]
    fn test_snippet_map_dedups_per_tag() {
        let mut map = SnippetMap::default();
        map.scope.tags = vec!["snap.a.x".into(), "snap.a.y".into()];
        map.add("mount");
        map.add("mount");
        map.scope.tags = vec!["snap.a.x".into()];
        map.add("umount");

        assert_eq!(map.security_tags(), vec!["snap.a.x", "snap.a.y"]);
        assert_eq!(map.snippet_for_tag("snap.a.x").as_deref(), Some("mount\numount"));
        assert_eq!(map.snippet_for_tag("snap.a.y").as_deref(), Some("mount"));
        assert_eq!(map.snippet_for_tag("snap.a.z"), None);
    }
}
