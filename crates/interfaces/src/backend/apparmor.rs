//! AppArmor profile snippets.

use super::{Backend, Scoped, Scope, SnippetMap, Specification, with_scope};
use crate::connection::{ConnectedPlug, ConnectedSlot};
use crate::interface::Interface;
use crate::package::{PlugInfo, SlotInfo};
use crate::Result;
use std::collections::{BTreeMap, BTreeSet};

/// Peer clause allowing any unconfined process.
pub const UNCONFINED_PEER: &str = "peer=(label=unconfined),";

/// Accumulated AppArmor snippets, keyed by security tag.
///
/// Besides rule snippets, a tag may carry profile directives such as
/// abstraction includes. Directives are kept apart from the rules, deduplicated
/// per tag and rendered ahead of them.
#[derive(Debug, Clone, Default)]
pub struct AppArmorSpec {
    snippets: SnippetMap,
    directives: BTreeMap<String, BTreeSet<String>>,
}

impl AppArmorSpec {
    /// Adds a snippet to every application in the current scope.
    pub fn add_snippet(&mut self, snippet: &str) {
        self.snippets.add(snippet);
    }

    /// Adds a profile directive to every application in the current scope.
    pub fn add_directive(&mut self, directive: &str) {
        for tag in &self.snippets.scope.tags {
            self.directives
                .entry(tag.clone())
                .or_default()
                .insert(directive.to_string());
        }
    }

    /// Directives of one tag, sorted.
    pub fn directives_for_tag(&self, tag: &str) -> Vec<&str> {
        self.directives
            .get(tag)
            .map(|d| d.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Directives then snippets for one tag, newline-joined.
    pub fn snippet_for_tag(&self, tag: &str) -> Option<String> {
        let directives = self.directives.get(tag);
        let snippets = self.snippets.snippet_for_tag(tag);
        if directives.is_none() && snippets.is_none() {
            return None;
        }
        let mut out: Vec<String> = directives.into_iter().flatten().cloned().collect();
        out.extend(snippets);
        Some(out.join("\n"))
    }

    /// `(tag, snippet)` pairs in tag order.
    pub fn snippets(&self) -> Vec<(String, String)> {
        self.security_tags()
            .into_iter()
            .filter_map(|tag| self.snippet_for_tag(&tag).map(|s| (tag, s)))
            .collect()
    }
}

/// Peer clause restricted to the given label expression.
pub fn peer_clause(label: impl std::fmt::Display) -> String {
    format!("peer=(label=\"{label}\"),")
}

impl Scoped for AppArmorSpec {
    fn scope_mut(&mut self) -> &mut Scope {
        self.snippets.scope_mut()
    }
}

impl Specification for AppArmorSpec {
    const BACKEND: Backend = Backend::AppArmor;

    fn add_connected_plug(
        &mut self,
        iface: &dyn Interface,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        with_scope(self, iface, plug.security_tags(), |spec| {
            iface.apparmor_connected_plug(spec, plug, slot)
        })
    }

    fn add_connected_slot(
        &mut self,
        iface: &dyn Interface,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        with_scope(self, iface, slot.security_tags(), |spec| {
            iface.apparmor_connected_slot(spec, plug, slot)
        })
    }

    fn add_permanent_plug(&mut self, iface: &dyn Interface, plug: &PlugInfo) -> Result<()> {
        with_scope(self, iface, plug.security_tags(), |spec| {
            iface.apparmor_permanent_plug(spec, plug)
        })
    }

    fn add_permanent_slot(&mut self, iface: &dyn Interface, slot: &SlotInfo) -> Result<()> {
        with_scope(self, iface, slot.security_tags(), |spec| {
            iface.apparmor_permanent_slot(spec, slot)
        })
    }

    fn security_tags(&self) -> Vec<String> {
        let mut tags: BTreeSet<String> = self.snippets.security_tags().into_iter().collect();
        tags.extend(self.directives.keys().cloned());
        tags.into_iter().collect()
    }
}
