//! D-Bus bus policy fragments.

use super::{Backend, Scoped, Scope, SnippetMap, Specification, with_scope};
use crate::connection::{ConnectedPlug, ConnectedSlot};
use crate::interface::Interface;
use crate::package::{PlugInfo, SlotInfo};
use crate::Result;

/// Accumulated `<policy>` elements, keyed by security tag.
#[derive(Debug, Clone, Default)]
pub struct DBusSpec {
    snippets: SnippetMap,
}

impl DBusSpec {
    pub fn add_snippet(&mut self, snippet: &str) {
        self.snippets.add(snippet);
    }

    pub fn snippet_for_tag(&self, tag: &str) -> Option<String> {
        self.snippets.snippet_for_tag(tag)
    }

    pub fn snippets(&self) -> Vec<(String, String)> {
        self.snippets.snippets()
    }
}

impl Scoped for DBusSpec {
    fn scope_mut(&mut self) -> &mut Scope {
        self.snippets.scope_mut()
    }
}

impl Specification for DBusSpec {
    const BACKEND: Backend = Backend::DBus;

    fn add_connected_plug(
        &mut self,
        iface: &dyn Interface,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        with_scope(self, iface, plug.security_tags(), |spec| {
            iface.dbus_connected_plug(spec, plug, slot)
        })
    }

    fn add_connected_slot(
        &mut self,
        iface: &dyn Interface,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        with_scope(self, iface, slot.security_tags(), |spec| {
            iface.dbus_connected_slot(spec, plug, slot)
        })
    }

    fn add_permanent_plug(&mut self, iface: &dyn Interface, plug: &PlugInfo) -> Result<()> {
        with_scope(self, iface, plug.security_tags(), |spec| {
            iface.dbus_permanent_plug(spec, plug)
        })
    }

    fn add_permanent_slot(&mut self, iface: &dyn Interface, slot: &SlotInfo) -> Result<()> {
        with_scope(self, iface, slot.security_tags(), |spec| {
            iface.dbus_permanent_slot(spec, slot)
        })
    }

    fn security_tags(&self) -> Vec<String> {
        self.snippets.security_tags()
    }
}
