//! Packages, applications and their plug/slot declarations.

use crate::attrs::{AttrValue, Attributes, Attrs};
use crate::label::Label;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Trust category of a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageType {
    #[default]
    App,
    Gadget,
    Os,
    Kernel,
    Base,
    Snapd,
}

impl PackageType {
    /// Whether the package describes the platform or its hardware.
    pub fn is_core_or_gadget(&self) -> bool {
        matches!(self, PackageType::Os | PackageType::Gadget)
    }
}

/// Security tag of one application entry point.
pub fn security_tag(package: &str, app: &str) -> String {
    format!("snap.{package}.{app}")
}

/// Identity of an installed package, shared by all of its declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    name: String,
    package_type: PackageType,
    apps: BTreeSet<String>,
}

impl PackageIdentity {
    pub fn new<I, S>(name: impl Into<String>, package_type: PackageType, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            package_type,
            apps: apps.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn package_type(&self) -> PackageType {
        self.package_type
    }

    /// Every application of the package, sorted.
    pub fn apps(&self) -> &BTreeSet<String> {
        &self.apps
    }

    pub fn security_tag(&self, app: &str) -> String {
        security_tag(&self.name, app)
    }
}

/// One application entry point and the plug/slot names it lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppInfo {
    pub name: String,
    pub plugs: BTreeSet<String>,
    pub slots: BTreeSet<String>,
}

/// A declared plug.
#[derive(Debug, Clone)]
pub struct PlugInfo {
    pub package: Arc<PackageIdentity>,
    pub name: String,
    pub interface: String,
    pub attrs: Attrs,
    /// Applications bound to this plug.
    pub apps: BTreeSet<String>,
}

impl PlugInfo {
    pub fn new(
        package: Arc<PackageIdentity>,
        name: impl Into<String>,
        interface: impl Into<String>,
        attrs: Attrs,
        apps: BTreeSet<String>,
    ) -> Self {
        Self {
            package,
            name: name.into(),
            interface: interface.into(),
            attrs,
            apps,
        }
    }

    /// Sorted security tags of the bound applications.
    pub fn security_tags(&self) -> Vec<String> {
        self.apps
            .iter()
            .map(|app| self.package.security_tag(app))
            .collect()
    }

    /// Label expression matching the applications bound to this plug.
    pub fn label(&self) -> Label {
        Label::compose(self.package.name(), self.package.apps(), &self.apps)
    }
}

impl Attributes for PlugInfo {
    fn lookup(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }
}

/// A declared slot.
#[derive(Debug, Clone)]
pub struct SlotInfo {
    pub package: Arc<PackageIdentity>,
    pub name: String,
    pub interface: String,
    pub attrs: Attrs,
    /// Applications bound to this slot.
    pub apps: BTreeSet<String>,
}

impl SlotInfo {
    pub fn new(
        package: Arc<PackageIdentity>,
        name: impl Into<String>,
        interface: impl Into<String>,
        attrs: Attrs,
        apps: BTreeSet<String>,
    ) -> Self {
        Self {
            package,
            name: name.into(),
            interface: interface.into(),
            attrs,
            apps,
        }
    }

    /// Sorted security tags of the bound applications.
    pub fn security_tags(&self) -> Vec<String> {
        self.apps
            .iter()
            .map(|app| self.package.security_tag(app))
            .collect()
    }

    /// Label expression matching the applications bound to this slot.
    pub fn label(&self) -> Label {
        Label::compose(self.package.name(), self.package.apps(), &self.apps)
    }
}

impl Attributes for SlotInfo {
    fn lookup(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }
}

/// Fully loaded metadata of one package.
#[derive(Debug, Clone)]
pub struct PackageInfo {
    pub identity: Arc<PackageIdentity>,
    pub apps: BTreeMap<String, AppInfo>,
    pub plugs: BTreeMap<String, PlugInfo>,
    pub slots: BTreeMap<String, SlotInfo>,
}

impl PackageInfo {
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn package_type(&self) -> PackageType {
        self.identity.package_type()
    }

    pub fn plug(&self, name: &str) -> Option<&PlugInfo> {
        self.plugs.get(name)
    }

    pub fn slot(&self, name: &str) -> Option<&SlotInfo> {
        self.slots.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_security_tags_are_sorted() {
        let package = Arc::new(PackageIdentity::new(
            "producer",
            PackageType::App,
            ["zeta", "alpha", "mid"],
        ));
        let slot = SlotInfo::new(
            package.clone(),
            "udisks2",
            "udisks2",
            Attrs::new(),
            ["zeta".to_string(), "alpha".to_string()].into(),
        );
        assert_eq!(
            slot.security_tags(),
            vec!["snap.producer.alpha", "snap.producer.zeta"]
        );
        assert_eq!(package.security_tag("mid"), "snap.producer.mid");
    }

    #[test]
    fn test_core_or_gadget() {
        assert!(PackageType::Os.is_core_or_gadget());
        assert!(PackageType::Gadget.is_core_or_gadget());
        assert!(!PackageType::App.is_core_or_gadget());
        assert!(!PackageType::Kernel.is_core_or_gadget());
    }
}
