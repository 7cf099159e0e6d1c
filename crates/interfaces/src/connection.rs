//! Plugs and slots as seen through a live connection.
//!
//! A connected end borrows its declaration and carries the attributes
//! supplied when the connection was made. Lookups consult those first and
//! fall back to the declaration, which is never modified.

use crate::attrs::{AttrError, AttrValue, Attributes, Attrs};
use crate::label::Label;
use crate::package::{PackageIdentity, PlugInfo, SlotInfo};
use crate::{Error, Result};

/// The plug end of a connection.
#[derive(Debug, Clone)]
pub struct ConnectedPlug<'a> {
    info: &'a PlugInfo,
    dynamic: Attrs,
}

impl<'a> ConnectedPlug<'a> {
    pub fn new(info: &'a PlugInfo, dynamic: Attrs) -> Self {
        Self { info, dynamic }
    }

    pub fn info(&self) -> &'a PlugInfo {
        self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn interface(&self) -> &str {
        &self.info.interface
    }

    pub fn package(&self) -> &PackageIdentity {
        &self.info.package
    }

    pub fn security_tags(&self) -> Vec<String> {
        self.info.security_tags()
    }

    pub fn label(&self) -> Label {
        self.info.label()
    }

    /// Sets a connection-time attribute, shadowing the declared one.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.dynamic.insert(key, value);
    }

    /// Integer attribute needed to compile this connection.
    pub fn require_int(&self, key: &str) -> Result<i64> {
        self.int_attr(key)
            .map_err(|e| connection_error(e, self.package(), key, self.interface()))
    }
}

impl Attributes for ConnectedPlug<'_> {
    fn lookup(&self, key: &str) -> Option<&AttrValue> {
        self.dynamic.get(key).or_else(|| self.info.attrs.get(key))
    }
}

/// The slot end of a connection.
#[derive(Debug, Clone)]
pub struct ConnectedSlot<'a> {
    info: &'a SlotInfo,
    dynamic: Attrs,
}

impl<'a> ConnectedSlot<'a> {
    pub fn new(info: &'a SlotInfo, dynamic: Attrs) -> Self {
        Self { info, dynamic }
    }

    pub fn info(&self) -> &'a SlotInfo {
        self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn interface(&self) -> &str {
        &self.info.interface
    }

    pub fn package(&self) -> &PackageIdentity {
        &self.info.package
    }

    pub fn security_tags(&self) -> Vec<String> {
        self.info.security_tags()
    }

    pub fn label(&self) -> Label {
        self.info.label()
    }

    /// Sets a connection-time attribute, shadowing the declared one.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) {
        self.dynamic.insert(key, value);
    }

    /// Integer attribute needed to compile this connection.
    pub fn require_int(&self, key: &str) -> Result<i64> {
        self.int_attr(key)
            .map_err(|e| connection_error(e, self.package(), key, self.interface()))
    }
}

impl Attributes for ConnectedSlot<'_> {
    fn lookup(&self, key: &str) -> Option<&AttrValue> {
        self.dynamic.get(key).or_else(|| self.info.attrs.get(key))
    }
}

fn connection_error(
    err: AttrError,
    package: &PackageIdentity,
    attr: &str,
    interface: &str,
) -> Error {
    match err {
        AttrError::Missing => Error::MissingConnectionAttribute {
            package: package.name().to_string(),
            attr: attr.to_string(),
            interface: interface.to_string(),
        },
        AttrError::WrongType { expected } => Error::ConnectionAttributeType {
            package: package.name().to_string(),
            attr: attr.to_string(),
            interface: interface.to_string(),
            expected,
        },
    }
}

/// A plug bound to a slot of the same interface.
#[derive(Debug, Clone)]
pub struct Connection<'a> {
    pub plug: ConnectedPlug<'a>,
    pub slot: ConnectedSlot<'a>,
}

impl<'a> Connection<'a> {
    /// Pairs two ends, refusing ends of different interfaces.
    pub fn new(plug: ConnectedPlug<'a>, slot: ConnectedSlot<'a>) -> Result<Self> {
        if plug.interface() != slot.interface() {
            return Err(Error::InterfaceMismatch {
                plug: format!("{}:{}", plug.package().name(), plug.name()),
                plug_interface: plug.interface().to_string(),
                slot: format!("{}:{}", slot.package().name(), slot.name()),
                slot_interface: slot.interface().to_string(),
            });
        }
        Ok(Self { plug, slot })
    }

    /// Connects two declarations without connection-time attributes.
    pub fn between(plug: &'a PlugInfo, slot: &'a SlotInfo) -> Result<Self> {
        Self::new(
            ConnectedPlug::new(plug, Attrs::new()),
            ConnectedSlot::new(slot, Attrs::new()),
        )
    }

    pub fn interface(&self) -> &str {
        self.plug.interface()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageType;
    use std::sync::Arc;

    fn slot() -> SlotInfo {
        let package = Arc::new(PackageIdentity::new("my-device", PackageType::Gadget, ["app"]));
        SlotInfo::new(
            package,
            "my-pin",
            "gpio",
            Attrs::new().with("number", 100_i64).with("direction", "out"),
            ["app".to_string()].into(),
        )
    }

    #[test]
    fn test_dynamic_attrs_shadow_static() {
        let info = slot();
        let mut connected = ConnectedSlot::new(&info, Attrs::new());
        assert_eq!(connected.int_attr("number"), Ok(100));

        connected.set_attr("number", 101_i64);
        assert_eq!(connected.int_attr("number"), Ok(101));
        assert_eq!(connected.str_attr("direction"), Ok("out"));
        // the declaration itself is untouched
        assert_eq!(info.int_attr("number"), Ok(100));
    }

    #[test]
    fn test_require_int_reports_connection_error() {
        let info = slot();
        let connected = ConnectedSlot::new(&info, Attrs::new());
        let err = connected.require_int("line").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"snap "my-device" does not have attribute "line" for interface "gpio""#
        );

        let connected = ConnectedSlot::new(&info, Attrs::new().with("number", "abc"));
        let err = connected.require_int("number").unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"snap "my-device" attribute "number" for interface "gpio" must be an int"#
        );
    }

    #[test]
    fn test_connection_rejects_mismatched_interfaces() {
        let info = slot();
        let plug = PlugInfo::new(
            info.package.clone(),
            "disks",
            "udisks2",
            Attrs::new(),
            ["app".to_string()].into(),
        );
        let err = Connection::between(&plug, &info).unwrap_err();
        assert!(matches!(err, Error::InterfaceMismatch { .. }));
    }
}
