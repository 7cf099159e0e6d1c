//! The interface contract.
//!
//! An [`Interface`] describes one capability type. It validates plug and
//! slot declarations, decides auto-connection, and contributes policy to
//! each backend through four hooks per backend:
//!
//! | hook                 | runs for                          | scoped to   |
//! |----------------------|-----------------------------------|-------------|
//! | `*_permanent_slot`   | every declared slot               | slot apps   |
//! | `*_permanent_plug`   | every declared plug               | plug apps   |
//! | `*_connected_slot`   | every connection                  | slot apps   |
//! | `*_connected_plug`   | every connection                  | plug apps   |
//!
//! Every hook defaults to contributing nothing.

use crate::backend::{AppArmorSpec, DBusSpec, SeccompSpec, SystemdSpec, UDevSpec};
use crate::connection::{ConnectedPlug, ConnectedSlot};
use crate::error::Side;
use crate::package::{PlugInfo, SlotInfo};
use crate::{Error, Result};

/// Descriptive, policy-relevant facts about an interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticInfo {
    pub summary: &'static str,
    /// Slot provided implicitly by the core package on all-snap systems.
    pub implicit_on_core: bool,
    /// Slot provided implicitly by the core package on classic systems.
    pub implicit_on_classic: bool,
    /// Base declaration fragment governing slots of this interface.
    pub base_declaration_slots: &'static str,
    /// Base declaration fragment governing plugs of this interface.
    pub base_declaration_plugs: &'static str,
}

#[allow(unused_variables)]
pub trait Interface: Send + Sync {
    /// Unique interface name.
    fn name(&self) -> &'static str;

    fn static_info(&self) -> StaticInfo {
        StaticInfo::default()
    }

    /// Checks a plug declaration at load time.
    fn before_prepare_plug(&self, plug: &PlugInfo) -> Result<()> {
        Ok(())
    }

    /// Checks a slot declaration at load time.
    fn before_prepare_slot(&self, slot: &SlotInfo) -> Result<()> {
        Ok(())
    }

    /// Whether this plug and slot may be connected without being asked.
    fn auto_connect(&self, plug: &PlugInfo, slot: &SlotInfo) -> bool {
        true
    }

    // AppArmor

    fn apparmor_connected_plug(
        &self,
        spec: &mut AppArmorSpec,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn apparmor_connected_slot(
        &self,
        spec: &mut AppArmorSpec,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn apparmor_permanent_plug(&self, spec: &mut AppArmorSpec, plug: &PlugInfo) -> Result<()> {
        Ok(())
    }

    fn apparmor_permanent_slot(&self, spec: &mut AppArmorSpec, slot: &SlotInfo) -> Result<()> {
        Ok(())
    }

    // seccomp

    fn seccomp_connected_plug(
        &self,
        spec: &mut SeccompSpec,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn seccomp_connected_slot(
        &self,
        spec: &mut SeccompSpec,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn seccomp_permanent_plug(&self, spec: &mut SeccompSpec, plug: &PlugInfo) -> Result<()> {
        Ok(())
    }

    fn seccomp_permanent_slot(&self, spec: &mut SeccompSpec, slot: &SlotInfo) -> Result<()> {
        Ok(())
    }

    // D-Bus

    fn dbus_connected_plug(
        &self,
        spec: &mut DBusSpec,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn dbus_connected_slot(
        &self,
        spec: &mut DBusSpec,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn dbus_permanent_plug(&self, spec: &mut DBusSpec, plug: &PlugInfo) -> Result<()> {
        Ok(())
    }

    fn dbus_permanent_slot(&self, spec: &mut DBusSpec, slot: &SlotInfo) -> Result<()> {
        Ok(())
    }

    // udev

    fn udev_connected_plug(
        &self,
        spec: &mut UDevSpec,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn udev_connected_slot(
        &self,
        spec: &mut UDevSpec,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn udev_permanent_plug(&self, spec: &mut UDevSpec, plug: &PlugInfo) -> Result<()> {
        Ok(())
    }

    fn udev_permanent_slot(&self, spec: &mut UDevSpec, slot: &SlotInfo) -> Result<()> {
        Ok(())
    }

    // systemd

    fn systemd_connected_plug(
        &self,
        spec: &mut SystemdSpec,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn systemd_connected_slot(
        &self,
        spec: &mut SystemdSpec,
        plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        Ok(())
    }

    fn systemd_permanent_plug(&self, spec: &mut SystemdSpec, plug: &PlugInfo) -> Result<()> {
        Ok(())
    }

    fn systemd_permanent_slot(&self, spec: &mut SystemdSpec, slot: &SlotInfo) -> Result<()> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Interface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interface").field("name", &self.name()).finish()
    }
}

/// Validates a plug declaration against `iface`.
pub fn sanitize_plug(iface: &dyn Interface, plug: &PlugInfo) -> Result<()> {
    if plug.interface != iface.name() {
        return Err(Error::WrongInterface {
            side: Side::Plug,
            name: plug.name.clone(),
            declared: plug.interface.clone(),
            used: iface.name().to_string(),
        });
    }
    iface.before_prepare_plug(plug)
}

/// Validates a slot declaration against `iface`.
pub fn sanitize_slot(iface: &dyn Interface, slot: &SlotInfo) -> Result<()> {
    if slot.interface != iface.name() {
        return Err(Error::WrongInterface {
            side: Side::Slot,
            name: slot.name.clone(),
            declared: slot.interface.clone(),
            used: iface.name().to_string(),
        });
    }
    iface.before_prepare_slot(slot)
}

/// Rejects slots of `iface` declared by anything but an os or gadget package.
pub fn reserve_slot_for_core_or_gadget(iface: &dyn Interface, slot: &SlotInfo) -> Result<()> {
    if slot.package.package_type().is_core_or_gadget() {
        return Ok(());
    }
    Err(Error::Reserved {
        interface: iface.name().to_string(),
        side: Side::Slot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::Attrs;
    use crate::package::{PackageIdentity, PackageType};
    use std::sync::Arc;

    struct Bare;

    impl Interface for Bare {
        fn name(&self) -> &'static str {
            "bare"
        }
    }

    fn slot(interface: &str, package_type: PackageType) -> SlotInfo {
        let package = Arc::new(PackageIdentity::new("pkg", package_type, ["app"]));
        SlotInfo::new(package, "s", interface, Attrs::new(), ["app".to_string()].into())
    }

    #[test]
    fn test_defaults_are_permissive() {
        let s = slot("bare", PackageType::App);
        let plug = PlugInfo::new(
            s.package.clone(),
            "p",
            "bare",
            Attrs::new(),
            ["app".to_string()].into(),
        );
        assert!(sanitize_slot(&Bare, &s).is_ok());
        assert!(sanitize_plug(&Bare, &plug).is_ok());
        assert!(Bare.auto_connect(&plug, &s));
        assert_eq!(Bare.static_info(), StaticInfo::default());
    }

    #[test]
    fn test_sanitize_with_wrong_interface() {
        let s = slot("other-interface", PackageType::Gadget);
        let err = sanitize_slot(&Bare, &s).unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"cannot sanitize slot "s" (interface "other-interface") using interface "bare""#
        );
    }

    #[test]
    fn test_reserved_for_core_or_gadget() {
        assert!(reserve_slot_for_core_or_gadget(&Bare, &slot("bare", PackageType::Os)).is_ok());
        assert!(
            reserve_slot_for_core_or_gadget(&Bare, &slot("bare", PackageType::Gadget)).is_ok()
        );
        let err = reserve_slot_for_core_or_gadget(&Bare, &slot("bare", PackageType::App))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "bare slots are reserved for the core and gadget snaps"
        );
    }
}
