//! udev device tagging rules.
//!
//! Unlike the tag-keyed backends, udev output is a flat list of rule lines.
//! Rules are order sensitive: detection rules jump forward to a `LABEL=` and must
//! come before any tagging rule. Emission order is kept and only exact
//! duplicates are dropped.

use super::{Backend, Scoped, Scope, Specification, TagSet, with_scope};
use crate::connection::{ConnectedPlug, ConnectedSlot};
use crate::interface::Interface;
use crate::package::{PlugInfo, SlotInfo};
use crate::Result;
use std::collections::BTreeSet;

/// Accumulated udev rules.
#[derive(Debug, Clone, Default)]
pub struct UDevSpec {
    scope: Scope,
    rules: Vec<String>,
    seen: BTreeSet<String>,
    tags: TagSet,
}

/// udev tag for a security tag; udev tags cannot contain dots.
pub fn udev_tag(security_tag: &str) -> String {
    security_tag.replace('.', "_")
}

impl UDevSpec {
    /// Adds a raw rule snippet, untied to any application.
    pub fn add_snippet(&mut self, snippet: &str) {
        self.push(snippet.to_string());
    }

    /// Tags devices matching `device_match` for every application in scope.
    pub fn tag_device(&mut self, device_match: &str) {
        let tags = self.scope.tags.clone();
        for security_tag in &tags {
            let rule = format!(
                "# {}\n{device_match}, TAG+=\"{}\"",
                self.scope.interface,
                udev_tag(security_tag)
            );
            self.push(rule);
        }
        self.tags.extend(&tags);
    }

    /// Rules in emission order.
    pub fn snippets(&self) -> &[String] {
        &self.rules
    }

    fn push(&mut self, rule: String) {
        if self.seen.insert(rule.clone()) {
            self.rules.push(rule);
        }
    }
}

impl Scoped for UDevSpec {
    fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }
}

impl Specification for UDevSpec {
    const BACKEND: Backend = Backend::UDev;

    fn add_connected_plug(
        &mut self,
        iface: &dyn Interface,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        with_scope(self, iface, plug.security_tags(), |spec| {
            iface.udev_connected_plug(spec, plug, slot)
        })
    }

    fn add_connected_slot(
        &mut self,
        iface: &dyn Interface,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        with_scope(self, iface, slot.security_tags(), |spec| {
            iface.udev_connected_slot(spec, plug, slot)
        })
    }

    fn add_permanent_plug(&mut self, iface: &dyn Interface, plug: &PlugInfo) -> Result<()> {
        with_scope(self, iface, plug.security_tags(), |spec| {
            iface.udev_permanent_plug(spec, plug)
        })
    }

    fn add_permanent_slot(&mut self, iface: &dyn Interface, slot: &SlotInfo) -> Result<()> {
        with_scope(self, iface, slot.security_tags(), |spec| {
            iface.udev_permanent_slot(spec, slot)
        })
    }

    fn security_tags(&self) -> Vec<String> {
        self.tags.to_vec()
    }
}
