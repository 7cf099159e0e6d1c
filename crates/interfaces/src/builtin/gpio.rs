//! The `gpio` interface: access to one exported GPIO pin.
//!
//! The slot names the pin with an integer `number` attribute and may only
//! come from the core or gadget package. Connecting exports the pin through
//! sysfs via a oneshot unit and lets the plug side read and write it.

use crate::attrs::{AttrError, Attributes};
use crate::backend::{AppArmorSpec, Service, ServiceType, SystemdSpec, interface_service_name};
use crate::connection::{ConnectedPlug, ConnectedSlot};
use crate::error::Side;
use crate::interface::{Interface, StaticInfo, reserve_slot_for_core_or_gadget};
use crate::package::{PlugInfo, SlotInfo};
use crate::{Error, Result};

const NAME: &str = "gpio";

const SUMMARY: &str = "allows access to specific GPIO pin";

const BASE_DECLARATION_SLOTS: &str = r#"
  gpio:
    allow-installation:
      slot-snap-type:
        - core
        - gadget
    deny-auto-connection: true
"#;

const SYSFS_GPIO: &str = "/sys/class/gpio";

#[derive(Debug, Default, Clone, Copy)]
pub struct GpioInterface;

/// Why a pin number is unusable, if it is.
fn check_number(number: i64) -> std::result::Result<(), String> {
    if number < 0 {
        return Err(format!("must not be negative, got {number}"));
    }
    Ok(())
}

/// Pin number of a connected slot, held to the same rules as the declaration
/// since connection attributes may override it.
fn connected_number(slot: &ConnectedSlot<'_>) -> Result<i64> {
    let number = slot.require_int("number")?;
    check_number(number).map_err(|reason| Error::InvalidConnectionAttribute {
        package: slot.package().name().to_string(),
        attr: "number".to_string(),
        interface: NAME.to_string(),
        reason,
    })?;
    Ok(number)
}

impl GpioInterface {
    fn invalid(&self, attr: &str, reason: String) -> Error {
        Error::InvalidAttribute {
            interface: NAME.to_string(),
            side: Side::Slot,
            attr: attr.to_string(),
            reason,
        }
    }
}

impl Interface for GpioInterface {
    fn name(&self) -> &'static str {
        NAME
    }

    fn static_info(&self) -> StaticInfo {
        StaticInfo {
            summary: SUMMARY,
            base_declaration_slots: BASE_DECLARATION_SLOTS,
            ..StaticInfo::default()
        }
    }

    fn before_prepare_slot(&self, slot: &SlotInfo) -> Result<()> {
        reserve_slot_for_core_or_gadget(self, slot)?;

        let number = slot
            .int_attr("number")
            .map_err(|e| e.into_validation(NAME, Side::Slot, "number"))?;
        check_number(number).map_err(|reason| self.invalid("number", reason))?;

        match slot.str_attr("direction") {
            Err(AttrError::Missing) => Ok(()),
            Err(e) => Err(e.into_validation(NAME, Side::Slot, "direction")),
            Ok("in" | "out") => Ok(()),
            Ok(other) => Err(self.invalid(
                "direction",
                format!("must be \"in\" or \"out\", got {other:?}"),
            )),
        }
    }

    /// A plug asking for a particular pin only pairs with the slot exporting it.
    fn auto_connect(&self, plug: &PlugInfo, slot: &SlotInfo) -> bool {
        match plug.int_attr("number") {
            Ok(wanted) => slot.int_attr("number") == Ok(wanted),
            Err(_) => true,
        }
    }

    fn apparmor_connected_plug(
        &self,
        spec: &mut AppArmorSpec,
        _plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        let number = connected_number(slot)?;
        // /sys/class/gpio/gpioN links into the device tree; AppArmor mediates
        // the resolved path, wherever the controller lives.
        spec.add_snippet(&format!("/sys/devices/**/gpio{number}/* rwk,"));
        Ok(())
    }

    fn systemd_connected_slot(
        &self,
        spec: &mut SystemdSpec,
        _plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        let number = connected_number(slot)?;
        let name = interface_service_name(slot.package().name(), &format!("{NAME}-{number}"));
        let pin = format!("{SYSFS_GPIO}/gpio{number}");
        let service = Service {
            service_type: ServiceType::Oneshot,
            remain_after_exit: true,
            exec_start: format!(
                "/bin/sh -c 'test -e {pin} || echo {number} > {SYSFS_GPIO}/export'"
            ),
            exec_stop: format!(
                "/bin/sh -c 'test ! -e {pin} || echo {number} > {SYSFS_GPIO}/unexport'"
            ),
        };
        spec.add_service(name, service)
    }
}
