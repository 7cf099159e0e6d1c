//! Interface registry: resolves interface names to contracts.
//!
//! A registry is assembled once from a fixed set of interfaces and is
//! read-only afterwards, so it can be shared freely between threads running
//! independent compile passes.

use crate::interface::{Interface, sanitize_plug, sanitize_slot};
use crate::package::PackageInfo;
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Immutable name → interface table.
#[derive(Debug, Clone)]
pub struct Registry {
    interfaces: BTreeMap<&'static str, Arc<dyn Interface>>,
}

impl Registry {
    /// Builds a registry, refusing two interfaces with the same name.
    pub fn new<I>(interfaces: I) -> Result<Self>
    where
        I: IntoIterator<Item = Arc<dyn Interface>>,
    {
        let mut map = BTreeMap::new();
        for iface in interfaces {
            let name = iface.name();
            if map.insert(name, iface).is_some() {
                return Err(Error::DuplicateInterface(name.to_string()));
            }
        }
        tracing::debug!(count = map.len(), "interface registry built");
        Ok(Self { interfaces: map })
    }

    /// Registry of every built-in interface.
    pub fn builtin() -> Result<Self> {
        Self::new(crate::builtin::interfaces())
    }

    /// Looks up an interface by name.
    pub fn get(&self, name: &str) -> Option<&dyn Interface> {
        self.interfaces.get(name).map(|i| i.as_ref())
    }

    /// Looks up an interface by name, failing if it is not registered.
    pub fn resolve(&self, name: &str) -> Result<&dyn Interface> {
        self.get(name)
            .ok_or_else(|| Error::UnknownInterface(name.to_string()))
    }

    /// All interfaces, sorted by name.
    pub fn interfaces(&self) -> impl Iterator<Item = &dyn Interface> {
        self.interfaces.values().map(|i| i.as_ref())
    }

    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Validates every plug and slot a package declares.
    ///
    /// Stops at the first failure; a package with any invalid declaration
    /// must be rejected as a whole.
    pub fn sanitize_package(&self, package: &PackageInfo) -> Result<()> {
        for plug in package.plugs.values() {
            let iface = self.resolve(&plug.interface)?;
            sanitize_plug(iface, plug).inspect_err(|e| {
                tracing::warn!(
                    package = package.name(),
                    plug = %plug.name,
                    error = %e,
                    "plug rejected"
                );
            })?;
        }
        for slot in package.slots.values() {
            let iface = self.resolve(&slot.interface)?;
            sanitize_slot(iface, slot).inspect_err(|e| {
                tracing::warn!(
                    package = package.name(),
                    slot = %slot.name,
                    error = %e,
                    "slot rejected"
                );
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Interface for Named {
        fn name(&self) -> &'static str {
            self.0
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = Registry::new([
            Arc::new(Named("beta")) as Arc<dyn Interface>,
            Arc::new(Named("alpha")),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.resolve("alpha").unwrap().name(), "alpha");
        let names: Vec<_> = registry.interfaces().map(|i| i.name()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let err = Registry::new([
            Arc::new(Named("gpio")) as Arc<dyn Interface>,
            Arc::new(Named("gpio")),
        ])
        .unwrap_err();
        assert!(matches!(err, Error::DuplicateInterface(name) if name == "gpio"));
    }

    #[test]
    fn test_unknown_interface() {
        let registry = Registry::new(Vec::new()).unwrap();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.resolve("nope"),
            Err(Error::UnknownInterface(_))
        ));
    }

    #[test]
    fn test_builtin_registry() {
        let registry = Registry::builtin().unwrap();
        assert!(registry.get("gpio").is_some());
        assert!(registry.get("udisks2").is_some());
    }

    #[test]
    fn test_registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();

        let registry = Arc::new(Registry::builtin().unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.resolve("gpio").map(|i| i.name()).ok())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some("gpio"));
        }
    }
}
