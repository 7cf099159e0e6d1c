//! Package manifest loading.
//!
//! A manifest is a TOML document describing one package:
//!
//! ```toml
//! name = "producer"
//! type = "app"            # app, gadget, os, kernel, base or snapd
//!
//! [apps.daemon]
//! slots = ["udisks2"]
//!
//! [apps.cli]
//!
//! [slots.udisks2]         # or: [slots] udisks2 = "udisks2"
//! interface = "udisks2"
//! ```
//!
//! Binding rules: a plug or slot listed by some apps is bound to exactly
//! those apps; one listed by no app is bound to all of them; a name listed
//! by an app but never declared becomes a declaration of the interface with
//! that same name.

use crate::attrs::{AttrValue, Attrs};
use crate::error::Side;
use crate::package::{AppInfo, PackageIdentity, PackageInfo, PackageType, PlugInfo, SlotInfo};
use crate::{Error, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct RawManifest {
    name: String,
    #[serde(rename = "type", default)]
    package_type: PackageType,
    #[serde(default)]
    apps: BTreeMap<String, RawApp>,
    #[serde(default)]
    plugs: BTreeMap<String, RawDecl>,
    #[serde(default)]
    slots: BTreeMap<String, RawDecl>,
}

#[derive(Debug, Default, Deserialize)]
struct RawApp {
    #[serde(default)]
    plugs: Vec<String>,
    #[serde(default)]
    slots: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDecl {
    Interface(String),
    Table(BTreeMap<String, toml::Value>),
}

/// Interface name, attributes and bound apps of one resolved declaration.
struct Resolved {
    name: String,
    interface: String,
    attrs: Attrs,
    apps: BTreeSet<String>,
}

impl PackageInfo {
    /// Load a package manifest from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse a package manifest from a TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        let raw: RawManifest = toml::from_str(toml).map_err(|e| Error::Manifest(e.to_string()))?;
        build(raw)
    }
}

fn build(raw: RawManifest) -> Result<PackageInfo> {
    check_name("package", &raw.name)?;
    for app in raw.apps.keys() {
        check_name("app", app)?;
    }
    let all_apps: BTreeSet<String> = raw.apps.keys().cloned().collect();
    let identity = Arc::new(PackageIdentity::new(
        raw.name.clone(),
        raw.package_type,
        all_apps.iter().cloned(),
    ));

    let plug_refs = references(&raw.apps, |app| &app.plugs);
    let slot_refs = references(&raw.apps, |app| &app.slots);

    let plugs = resolve(Side::Plug, &raw.plugs, &plug_refs, &all_apps)?;
    let slots = resolve(Side::Slot, &raw.slots, &slot_refs, &all_apps)?;

    let shared = plugs
        .iter()
        .map(|p| &p.name)
        .find(|n| slots.iter().any(|s| &s.name == *n));
    if let Some(name) = shared {
        return Err(Error::Manifest(format!(
            "cannot have plug and slot with the same name: {name:?}"
        )));
    }

    let mut apps: BTreeMap<String, AppInfo> = all_apps
        .iter()
        .map(|name| {
            let info = AppInfo {
                name: name.clone(),
                ..AppInfo::default()
            };
            (name.clone(), info)
        })
        .collect();
    for plug in &plugs {
        for app in &plug.apps {
            if let Some(info) = apps.get_mut(app) {
                info.plugs.insert(plug.name.clone());
            }
        }
    }
    for slot in &slots {
        for app in &slot.apps {
            if let Some(info) = apps.get_mut(app) {
                info.slots.insert(slot.name.clone());
            }
        }
    }

    let plugs = plugs
        .into_iter()
        .map(|r| {
            let info =
                PlugInfo::new(identity.clone(), r.name.clone(), r.interface, r.attrs, r.apps);
            (r.name, info)
        })
        .collect();
    let slots = slots
        .into_iter()
        .map(|r| {
            let info =
                SlotInfo::new(identity.clone(), r.name.clone(), r.interface, r.attrs, r.apps);
            (r.name, info)
        })
        .collect();

    Ok(PackageInfo {
        identity,
        apps,
        plugs,
        slots,
    })
}

/// Maps each plug or slot name to the apps that list it.
fn references<F>(apps: &BTreeMap<String, RawApp>, names: F) -> BTreeMap<String, BTreeSet<String>>
where
    F: Fn(&RawApp) -> &Vec<String>,
{
    let mut refs: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (app_name, app) in apps {
        for name in names(app) {
            refs.entry(name.clone()).or_default().insert(app_name.clone());
        }
    }
    refs
}

fn resolve(
    side: Side,
    declared: &BTreeMap<String, RawDecl>,
    refs: &BTreeMap<String, BTreeSet<String>>,
    all_apps: &BTreeSet<String>,
) -> Result<Vec<Resolved>> {
    let names: BTreeSet<&String> = declared.keys().chain(refs.keys()).collect();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let (interface, attrs) = match declared.get(name) {
            Some(RawDecl::Interface(iface)) => (iface.clone(), Attrs::new()),
            Some(RawDecl::Table(table)) => split_table(side, name, table)?,
            None => (name.clone(), Attrs::new()),
        };
        let apps = refs.get(name).cloned().unwrap_or_else(|| all_apps.clone());
        out.push(Resolved {
            name: name.clone(),
            interface,
            attrs,
            apps,
        });
    }
    Ok(out)
}

fn split_table(
    side: Side,
    name: &str,
    table: &BTreeMap<String, toml::Value>,
) -> Result<(String, Attrs)> {
    let mut interface = name.to_string();
    let mut attrs = Attrs::new();
    for (key, value) in table {
        if key == "interface" {
            let toml::Value::String(iface) = value else {
                return Err(Error::Manifest(format!(
                    "interface of {side} {name:?} must be a string"
                )));
            };
            interface = iface.clone();
            continue;
        }
        let value = match value {
            toml::Value::String(s) => AttrValue::Str(s.clone()),
            toml::Value::Integer(n) => AttrValue::Int(*n),
            toml::Value::Boolean(b) => AttrValue::Bool(*b),
            other => {
                return Err(Error::Manifest(format!(
                    "attribute {key:?} of {side} {name:?} has unsupported type {}",
                    other.type_str()
                )));
            }
        };
        attrs.insert(key.clone(), value);
    }
    Ok((interface, attrs))
}

/// Package and app names end up inside security tags, so only lowercase
/// letters, digits and inner dashes are accepted.
fn check_name(what: &str, name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && !name.ends_with('-')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::Manifest(format!("invalid {what} name: {name:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gadget() {
        let info = PackageInfo::parse(
            r#"
name = "my-device"
type = "gadget"

[slots]
bad-interface-slot = "other-interface"
my-pin = { interface = "gpio", number = 100 }

[plugs]
plug = "gpio"
"#,
        )
        .unwrap();
        assert_eq!(info.name(), "my-device");
        assert_eq!(info.package_type(), PackageType::Gadget);
        let pin = info.slot("my-pin").unwrap();
        assert_eq!(pin.interface, "gpio");
        assert_eq!(pin.attrs.get("number"), Some(&AttrValue::Int(100)));
        assert!(pin.apps.is_empty());
        assert_eq!(info.slot("bad-interface-slot").unwrap().interface, "other-interface");
        assert_eq!(info.plug("plug").unwrap().interface, "gpio");
    }

    #[test]
    fn test_binding_rules() {
        let info = PackageInfo::parse(
            r#"
name = "producer"

[apps.app1]
slots = ["udisks2"]

[apps.app2]

[apps.app3]
slots = ["udisks2"]

[slots]
other = "network"
"#,
        )
        .unwrap();

        // listed by two apps: bound to exactly those, implicitly declared
        let udisks2 = info.slot("udisks2").unwrap();
        assert_eq!(udisks2.interface, "udisks2");
        assert_eq!(
            udisks2.apps.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["app1", "app3"]
        );

        // listed by no app: bound to all of them
        let other = info.slot("other").unwrap();
        assert_eq!(other.apps.len(), 3);

        assert!(info.apps["app2"].slots.contains("other"));
        assert!(!info.apps["app2"].slots.contains("udisks2"));
    }

    #[test]
    fn test_unsupported_attribute_type() {
        let err = PackageInfo::parse(
            r#"
name = "my-device"
type = "gadget"

[slots.pin]
interface = "gpio"
number = 1.5
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains(r#"attribute "number" of slot "pin""#));
    }

    #[test]
    fn test_plug_and_slot_share_name() {
        let err = PackageInfo::parse(
            r#"
name = "p"

[plugs]
x = "gpio"

[slots]
x = "gpio"
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("same name"));
    }

    #[test]
    fn test_invalid_names() {
        assert!(PackageInfo::parse(r#"name = "Bad.Name""#).is_err());
        assert!(PackageInfo::parse("name = \"ok\"\n[apps.\"a.b\"]\n").is_err());
        assert!(PackageInfo::parse(r#"name = "ok-name2""#).is_ok());
    }
}
