//! The `udisks2` interface: operating as, or talking to, the UDisks2 service.
//!
//! The slot side is the storage daemon itself and receives broad mount and
//! device access; the plug side may only talk to it over the system bus.

use crate::backend::{AppArmorSpec, DBusSpec, SeccompSpec, UDevSpec, peer_clause};
use crate::connection::{ConnectedPlug, ConnectedSlot};
use crate::interface::{Interface, StaticInfo};
use crate::package::SlotInfo;
use crate::Result;

const NAME: &str = "udisks2";

const SUMMARY: &str = "allows operating as or interacting with the UDisks2 service";

const BASE_DECLARATION_SLOTS: &str = r#"
  udisks2:
    allow-installation:
      slot-snap-type:
        - app
    deny-connection: true
    deny-auto-connection: true
"#;

const DBUS_STRICT: &str = "#include <abstractions/dbus-strict>";

const SLOT_SECURITY_TAGS: &str = "###SLOT_SECURITY_TAGS###";
const PLUG_SECURITY_TAGS: &str = "###PLUG_SECURITY_TAGS###";

const PERMANENT_SLOT_APPARMOR: &str = r#"
# Description: Allow operating as the udisks2. This gives privileged access to
# the system.

# DBus accesses
dbus (send)
    bus=system
    path=/org/freedesktop/DBus
    interface=org.freedesktop.DBus
    member="{Request,Release}Name"
    peer=(name=org.freedesktop.DBus, label=unconfined),

dbus (send)
    bus=system
    path=/org/freedesktop/DBus
    interface=org.freedesktop.DBus
    member="GetConnectionUnix{ProcessID,User}"
    peer=(label=unconfined),

# Allow binding the service to the requested connection name
dbus (bind)
    bus=system
    name="org.freedesktop.UDisks2",

# Allow unconfined to talk to us. The API for unconfined will be limited
# with DBus policy, below.
dbus (receive, send)
    bus=system
    path=/org/freedesktop/UDisks2{,/**}
    interface=org.freedesktop.DBus*
    peer=(label=unconfined),

# Needed for mount/unmount operations
capability sys_admin,

# Allow scanning of devices
network netlink raw,
/run/udev/data/b[0-9]*:[0-9]* r,
/sys/devices/**/block/** r,

# Mount points could be in /run/media/<user>/* or /media/<user>/*
/run/systemd/seats/* r,
/{,run/}media/{,**} rw,
mount options=(ro,nosuid,nodev) /dev/{sd*,mmcblk*} -> /{,run/}media/**,
mount options=(rw,nosuid,nodev) /dev/{sd*,mmcblk*} -> /{,run/}media/**,
umount /{,run/}media/**,

# This should probably be patched to use $SNAP_DATA/run/...
/run/udisks2/{,**} rw,

# udisksd execs mount/umount to do the actual operations
/bin/mount ixr,
/bin/umount ixr,

# mount/umount (via libmount) track some mount info in these files
/run/mount/utab* wrl,

# Udisks2 needs to read the raw device for partition information. These rules
# give raw read access to the system disks and therefore the entire system.
/dev/sd* r,
/dev/mmcblk* r,
/dev/vd* r,

# Needed for probing raw devices
capability sys_rawio,
"#;

const CONNECTED_SLOT_APPARMOR: &str = r####"
# Allow connected clients to interact with the service. This gives privileged
# access to the system.

dbus (receive, send)
    bus=system
    path=/org/freedesktop/UDisks2/**
    interface=org.freedesktop.DBus.Properties
    peer=(label="###PLUG_SECURITY_TAGS###"),

dbus (receive, send)
    bus=system
    path=/org/freedesktop/UDisks2
    interface=org.freedesktop.DBus.ObjectManager
    peer=(label="###PLUG_SECURITY_TAGS###"),

# Allow access to the Udisks2 API
dbus (receive, send)
    bus=system
    path=/org/freedesktop/UDisks2/**
    interface=org.freedesktop.UDisks2.*
    peer=(label="###PLUG_SECURITY_TAGS###"),

# Allow clients to introspect the service
dbus (receive)
    bus=system
    path=/org/freedesktop/UDisks2
    interface=org.freedesktop.DBus.Introspectable
    member=Introspect
    peer=(label="###PLUG_SECURITY_TAGS###"),
"####;

const CONNECTED_PLUG_APPARMOR: &str = r####"
# Description: Allow using udisks service. This gives privileged access to the
# service.

dbus (receive, send)
    bus=system
    path=/org/freedesktop/UDisks2/**
    interface=org.freedesktop.DBus.Properties
    peer=(label="###SLOT_SECURITY_TAGS###"),

dbus (receive, send)
    bus=system
    path=/org/freedesktop/UDisks2
    interface=org.freedesktop.DBus.ObjectManager
    peer=(label="###SLOT_SECURITY_TAGS###"),

# Allow access to the Udisks2 API
dbus (receive, send)
    bus=system
    path=/org/freedesktop/UDisks2/**
    interface=org.freedesktop.UDisks2.*
    peer=(label="###SLOT_SECURITY_TAGS###"),

# Allow clients to introspect the service
dbus (send)
    bus=system
    path=/org/freedesktop/UDisks2
    interface=org.freedesktop.DBus.Introspectable
    member=Introspect
    peer=(label="###SLOT_SECURITY_TAGS###"),
"####;

const PERMANENT_SLOT_SECCOMP: &str = r#"
bind
chown32
fchown
fchown32
fchownat
lchown
lchown32
mount
shmctl
umount
umount2
# libudev
socket AF_NETLINK - NETLINK_KOBJECT_UEVENT
"#;

const PERMANENT_SLOT_DBUS: &str = r#"
<policy user="root">
    <allow own="org.freedesktop.UDisks2"/>
    <allow send_destination="org.freedesktop.UDisks2"/>
</policy>

<policy context="default">
    <allow send_destination="org.freedesktop.UDisks2" send_interface="org.freedesktop.DBus.Introspectable" />
</policy>
"#;

const CONNECTED_PLUG_DBUS: &str = r#"
<policy context="default">
    <deny own="org.freedesktop.UDisks2"/>
    <deny send_destination="org.freedesktop.UDisks2"/>
</policy>
"#;

const PERMANENT_SLOT_UDEV: &str = r#"
# Skip probing if not a block device or if requested by other rules
SUBSYSTEM!="block", GOTO="udisks_probe_end"
ENV{DM_MULTIPATH_DEVICE_PATH}=="?*", GOTO="udisks_probe_end"
ENV{DM_UDEV_DISABLE_OTHER_RULES_FLAG}=="?*", GOTO="udisks_probe_end"

# MD-RAID (aka Linux Software RAID) members
SUBSYSTEM=="block", ENV{ID_FS_USAGE}=="raid", ENV{ID_FS_TYPE}=="linux_raid_member", ENV{UDISKS_MD_MEMBER_LEVEL}=="", IMPORT{program}="/bin/sh -c '/sbin/mdadm --examine --export $tempnode | sed s/^MD_/UDISKS_MD_MEMBER_/g'"

SUBSYSTEM=="block", KERNEL=="md*", ENV{DEVTYPE}!="partition", IMPORT{program}="/bin/sh -c '/sbin/mdadm --detail --export $tempnode | sed s/^MD_/UDISKS_MD_/g'"

LABEL="udisks_probe_end"

# Mark devices that should be ignored by udisks2
SUBSYSTEM=="block", ENV{ID_FS_USAGE}=="filesystem", ENV{ID_FS_TYPE}=="swap", ENV{UDISKS_IGNORE}="1"
"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct UDisks2Interface;

impl Interface for UDisks2Interface {
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

    fn apparmor_connected_plug(
        &self,
        spec: &mut AppArmorSpec,
        _plug: &ConnectedPlug<'_>,
        slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        let snippet = CONNECTED_PLUG_APPARMOR.replace(
            &format!("peer=(label=\"{SLOT_SECURITY_TAGS}\"),"),
            &peer_clause(slot.label()),
        );
        spec.add_directive(DBUS_STRICT);
        spec.add_snippet(&snippet);
        Ok(())
    }

    fn apparmor_connected_slot(
        &self,
        spec: &mut AppArmorSpec,
        plug: &ConnectedPlug<'_>,
        _slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        let snippet = CONNECTED_SLOT_APPARMOR.replace(
            &format!("peer=(label=\"{PLUG_SECURITY_TAGS}\"),"),
            &peer_clause(plug.label()),
        );
        spec.add_snippet(&snippet);
        Ok(())
    }

    fn apparmor_permanent_slot(&self, spec: &mut AppArmorSpec, _slot: &SlotInfo) -> Result<()> {
        spec.add_directive(DBUS_STRICT);
        spec.add_snippet(PERMANENT_SLOT_APPARMOR);
        Ok(())
    }

    fn seccomp_permanent_slot(&self, spec: &mut SeccompSpec, _slot: &SlotInfo) -> Result<()> {
        spec.add_snippet(PERMANENT_SLOT_SECCOMP);
        Ok(())
    }

    fn dbus_connected_plug(
        &self,
        spec: &mut DBusSpec,
        _plug: &ConnectedPlug<'_>,
        _slot: &ConnectedSlot<'_>,
    ) -> Result<()> {
        spec.add_snippet(CONNECTED_PLUG_DBUS);
        Ok(())
    }

    fn dbus_permanent_slot(&self, spec: &mut DBusSpec, _slot: &SlotInfo) -> Result<()> {
        spec.add_snippet(PERMANENT_SLOT_DBUS);
        Ok(())
    }

    fn udev_permanent_slot(&self, spec: &mut UDevSpec, _slot: &SlotInfo) -> Result<()> {
        // detection rules jump to the label, so they go before any tagging
        spec.add_snippet(PERMANENT_SLOT_UDEV);
        spec.tag_device(r#"SUBSYSTEM=="block""#);
        spec.tag_device(r#"SUBSYSTEM=="usb""#);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::Attrs;
    use crate::backend::Specification;
    use crate::interface::sanitize_slot;
    use crate::package::PlugInfo;
    use crate::testutil;

    const CONSUMER: &str = "name = \"consumer\"\n[apps.app]\nplugs = [\"udisks2\"]\n";

    const CONSUMER_TWO_APPS: &str = r#"
name = "consumer"
[apps.app1]
plugs = ["udisks2"]
[apps.app2]
plugs = ["udisks2"]
"#;

    const CONSUMER_THREE_APPS: &str = r#"
name = "consumer"
[apps.app1]
plugs = ["udisks2"]
[apps.app2]
plugs = ["udisks2"]
[apps.app3]
"#;

    const PRODUCER: &str = "name = \"producer\"\n[apps.app]\nslots = [\"udisks2\"]\n";

    const PRODUCER_TWO_APPS: &str = r#"
name = "producer"
[apps.app1]
slots = ["udisks2"]
[apps.app2]
slots = ["udisks2"]
"#;

    const PRODUCER_THREE_APPS: &str = r#"
name = "producer"
[apps.app1]
slots = ["udisks2"]
[apps.app2]
[apps.app3]
slots = ["udisks2"]
"#;

    fn plug(manifest: &str) -> PlugInfo {
        testutil::plug(manifest, "udisks2")
    }

    fn slot(manifest: &str) -> SlotInfo {
        testutil::slot(manifest, "udisks2")
    }

    fn connected_plug_snippet(plug_info: &PlugInfo, slot_info: &SlotInfo) -> AppArmorSpec {
        let mut spec = AppArmorSpec::default();
        spec.add_connected_plug(
            &UDisks2Interface,
            &ConnectedPlug::new(plug_info, Attrs::new()),
            &ConnectedSlot::new(slot_info, Attrs::new()),
        )
        .unwrap();
        spec
    }

    fn connected_slot_snippet(plug_info: &PlugInfo, slot_info: &SlotInfo) -> AppArmorSpec {
        let mut spec = AppArmorSpec::default();
        spec.add_connected_slot(
            &UDisks2Interface,
            &ConnectedPlug::new(plug_info, Attrs::new()),
            &ConnectedSlot::new(slot_info, Attrs::new()),
        )
        .unwrap();
        spec
    }

    #[test]
    fn test_name() {
        assert_eq!(UDisks2Interface.name(), "udisks2");
    }

    #[test]
    fn test_sanitize_slot() {
        assert!(sanitize_slot(&UDisks2Interface, &slot(PRODUCER)).is_ok());
    }

    #[test]
    fn test_apparmor_connected_plug_labels() {
        let consumer = plug(CONSUMER);
        let cases = [
            // exactly one app bound to the slot
            (PRODUCER, r#"peer=(label="snap.producer.app"),"#),
            // all apps bound to the slot
            (PRODUCER_TWO_APPS, r#"peer=(label="snap.producer.*"),"#),
            // some but not all apps bound to the slot
            (PRODUCER_THREE_APPS, r#"peer=(label="snap.producer.{app1,app3}"),"#),
        ];
        for (producer, expected) in cases {
            let spec = connected_plug_snippet(&consumer, &slot(producer));
            assert_eq!(spec.security_tags(), vec!["snap.consumer.app"]);
            let snippet = spec.snippet_for_tag("snap.consumer.app").unwrap();
            // every peer rule in the template names the bound apps
            assert_eq!(snippet.matches(expected).count(), 4, "in\n{snippet}");
            assert!(!snippet.contains(SLOT_SECURITY_TAGS));
            assert!(!snippet.contains("unconfined"));
        }
    }

    #[test]
    fn test_apparmor_connected_slot_labels() {
        let producer = slot(PRODUCER);
        let cases = [
            (CONSUMER, r#"peer=(label="snap.consumer.app"),"#),
            (CONSUMER_TWO_APPS, r#"peer=(label="snap.consumer.*"),"#),
            (CONSUMER_THREE_APPS, r#"peer=(label="snap.consumer.{app1,app2}"),"#),
        ];
        for (consumer, expected) in cases {
            let spec = connected_slot_snippet(&plug(consumer), &producer);
            assert_eq!(spec.security_tags(), vec!["snap.producer.app"]);
            let snippet = spec.snippet_for_tag("snap.producer.app").unwrap();
            // every peer rule in the template names the bound apps
            assert_eq!(snippet.matches(expected).count(), 4, "in\n{snippet}");
            assert!(!snippet.contains(PLUG_SECURITY_TAGS));
            assert!(!snippet.contains("unconfined"));
        }
    }

    #[test]
    fn test_apparmor_permanent_slot() {
        let consumer = plug(CONSUMER);
        let producer = slot(PRODUCER);

        let mut spec = connected_plug_snippet(&consumer, &producer);
        spec.add_permanent_slot(&UDisks2Interface, &producer).unwrap();
        assert_eq!(
            spec.security_tags(),
            vec!["snap.consumer.app", "snap.producer.app"]
        );
        assert!(
            spec.snippet_for_tag("snap.consumer.app")
                .unwrap()
                .contains(r#"peer=(label="snap.producer.app"),"#)
        );
        assert!(
            spec.snippet_for_tag("snap.producer.app")
                .unwrap()
                .contains("peer=(label=unconfined),")
        );
        for tag in ["snap.consumer.app", "snap.producer.app"] {
            assert_eq!(spec.directives_for_tag(tag), vec![DBUS_STRICT]);
        }
    }

    #[test]
    fn test_dbus_spec() {
        let consumer = plug(CONSUMER);
        let producer = slot(PRODUCER);

        let mut spec = DBusSpec::default();
        spec.add_connected_plug(
            &UDisks2Interface,
            &ConnectedPlug::new(&consumer, Attrs::new()),
            &ConnectedSlot::new(&producer, Attrs::new()),
        )
        .unwrap();
        assert_eq!(spec.security_tags(), vec!["snap.consumer.app"]);
        assert!(
            spec.snippet_for_tag("snap.consumer.app")
                .unwrap()
                .contains(r#"<policy context="default">"#)
        );

        let mut spec = DBusSpec::default();
        spec.add_permanent_slot(&UDisks2Interface, &producer).unwrap();
        assert_eq!(spec.security_tags(), vec!["snap.producer.app"]);
        assert!(
            spec.snippet_for_tag("snap.producer.app")
                .unwrap()
                .contains(r#"<policy user="root">"#)
        );
    }

    #[test]
    fn test_udev_spec() {
        let mut spec = UDevSpec::default();
        spec.add_permanent_slot(&UDisks2Interface, &slot(PRODUCER))
            .unwrap();

        let snippets = spec.snippets();
        assert_eq!(snippets.len(), 3);
        assert!(snippets[0].contains(r#"LABEL="udisks_probe_end""#));
        for subsystem in ["block", "usb"] {
            let rule = format!("# udisks2\nSUBSYSTEM==\"{subsystem}\", TAG+=\"snap_producer_app\"");
            assert!(snippets.contains(&rule));
        }
        assert_eq!(spec.security_tags(), vec!["snap.producer.app"]);
    }

    #[test]
    fn test_udev_spec_is_idempotent() {
        let producer = slot(PRODUCER);
        let mut spec = UDevSpec::default();
        spec.add_permanent_slot(&UDisks2Interface, &producer).unwrap();
        spec.add_permanent_slot(&UDisks2Interface, &producer).unwrap();
        assert_eq!(spec.snippets().len(), 3);
    }

    #[test]
    fn test_seccomp_spec() {
        let mut spec = SeccompSpec::default();
        spec.add_permanent_slot(&UDisks2Interface, &slot(PRODUCER))
            .unwrap();
        assert_eq!(spec.security_tags(), vec!["snap.producer.app"]);
        assert!(
            spec.snippet_for_tag("snap.producer.app")
                .unwrap()
                .contains("mount\n")
        );
    }

    #[test]
    fn test_static_info() {
        let info = UDisks2Interface.static_info();
        assert!(!info.implicit_on_core);
        assert!(!info.implicit_on_classic);
        assert_eq!(
            info.summary,
            "allows operating as or interacting with the UDisks2 service"
        );
        assert!(info.base_declaration_slots.contains("udisks2"));
    }

    #[test]
    fn test_auto_connect() {
        assert!(UDisks2Interface.auto_connect(&plug(CONSUMER), &slot(PRODUCER)));
    }

    #[test]
    fn test_registered_as_builtin() {
        let names: Vec<_> = crate::builtin::interfaces()
            .iter()
            .map(|i| i.name())
            .collect();
        assert!(names.contains(&"udisks2"));
    }
}
