//! Specification compiler.
//!
//! A pass walks one backend over a fixed input: permanent slots, then
//! permanent plugs, then each connection (connected plug before connected
//! slot), all in input order. The first contribution error aborts the pass
//! and the partially filled accumulator is dropped.

use crate::backend::{
    AppArmorSpec, Backend, DBusSpec, SeccompSpec, Service, Specification, SystemdSpec, UDevSpec,
};
use crate::connection::Connection;
use crate::package::{PackageInfo, PlugInfo, SlotInfo};
use crate::registry::Registry;
use crate::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Declarations and connections a pass compiles.
#[derive(Debug, Clone, Default)]
pub struct CompileInput<'a> {
    pub permanent_slots: Vec<&'a SlotInfo>,
    pub permanent_plugs: Vec<&'a PlugInfo>,
    pub connections: Vec<Connection<'a>>,
}

impl<'a> CompileInput<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every plug and slot declared by `packages`, as permanent
    /// declarations, in package order.
    pub fn from_packages(packages: &'a [PackageInfo]) -> Self {
        let mut input = Self::new();
        for package in packages {
            input.permanent_slots.extend(package.slots.values());
            input.permanent_plugs.extend(package.plugs.values());
        }
        input
    }

    pub fn with_connection(mut self, connection: Connection<'a>) -> Self {
        self.connections.push(connection);
        self
    }
}

/// One security tag and its joined policy text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedSnippet {
    pub tag: String,
    pub snippet: String,
}

impl TaggedSnippet {
    fn collect(pairs: Vec<(String, String)>) -> Vec<Self> {
        pairs
            .into_iter()
            .map(|(tag, snippet)| Self { tag, snippet })
            .collect()
    }
}

/// Output of a multi-backend compile, one field per selected backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Compiled {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apparmor: Option<Vec<TaggedSnippet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seccomp: Option<Vec<TaggedSnippet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dbus: Option<Vec<TaggedSnippet>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udev: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systemd: Option<BTreeMap<String, Service>>,
}

/// Drives interface contributions into backend accumulators.
#[derive(Debug, Clone, Copy)]
pub struct Compiler<'r> {
    registry: &'r Registry,
}

impl<'r> Compiler<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Runs a single backend pass.
    pub fn compile<S: Specification>(&self, input: &CompileInput<'_>) -> Result<S> {
        let _span = tracing::debug_span!("compile", backend = %S::BACKEND).entered();
        let mut spec = S::default();

        for slot in &input.permanent_slots {
            let iface = self.registry.resolve(&slot.interface)?;
            spec.add_permanent_slot(iface, slot)?;
        }
        for plug in &input.permanent_plugs {
            let iface = self.registry.resolve(&plug.interface)?;
            spec.add_permanent_plug(iface, plug)?;
        }
        for connection in &input.connections {
            let iface = self.registry.resolve(connection.interface())?;
            spec.add_connected_plug(iface, &connection.plug, &connection.slot)?;
            spec.add_connected_slot(iface, &connection.plug, &connection.slot)?;
        }

        tracing::debug!(
            slots = input.permanent_slots.len(),
            plugs = input.permanent_plugs.len(),
            connections = input.connections.len(),
            tags = ?spec.security_tags(),
            "pass finished"
        );
        Ok(spec)
    }

    /// Compiles every backend.
    pub fn compile_all(&self, input: &CompileInput<'_>) -> Result<Compiled> {
        self.compile_backends(input, &Backend::ALL)
    }

    /// Compiles the selected backends, stopping at the first failing pass.
    pub fn compile_backends(
        &self,
        input: &CompileInput<'_>,
        backends: &[Backend],
    ) -> Result<Compiled> {
        let mut out = Compiled::default();
        for backend in backends {
            match backend {
                Backend::AppArmor => {
                    let spec: AppArmorSpec = self.compile(input)?;
                    out.apparmor = Some(TaggedSnippet::collect(spec.snippets()));
                }
                Backend::Seccomp => {
                    let spec: SeccompSpec = self.compile(input)?;
                    out.seccomp = Some(TaggedSnippet::collect(spec.snippets()));
                }
                Backend::DBus => {
                    let spec: DBusSpec = self.compile(input)?;
                    out.dbus = Some(TaggedSnippet::collect(spec.snippets()));
                }
                Backend::UDev => {
                    let spec: UDevSpec = self.compile(input)?;
                    out.udev = Some(spec.snippets().to_vec());
                }
                Backend::Systemd => {
                    let spec: SystemdSpec = self.compile(input)?;
                    out.systemd = Some(spec.services().clone());
                }
            }
        }
        Ok(out)
    }

    /// Plug/slot pairs across `packages` that share an interface and that
    /// the interface would connect automatically.
    pub fn auto_connect_candidates<'p>(
        &self,
        packages: &'p [PackageInfo],
    ) -> Result<Vec<(&'p PlugInfo, &'p SlotInfo)>> {
        let mut candidates = Vec::new();
        for plug in packages.iter().flat_map(|p| p.plugs.values()) {
            let iface = self.registry.resolve(&plug.interface)?;
            for slot in packages.iter().flat_map(|p| p.slots.values()) {
                if slot.interface == plug.interface && iface.auto_connect(plug, slot) {
                    candidates.push((plug, slot));
                }
            }
        }
        Ok(candidates)
    }
}
