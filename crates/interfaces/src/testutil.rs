//! Fixtures shared by unit tests.

use crate::package::{PackageInfo, PlugInfo, SlotInfo};

/// Parses an inline manifest, panicking on error.
pub(crate) fn package(manifest: &str) -> PackageInfo {
    PackageInfo::parse(manifest).unwrap_or_else(|e| panic!("bad test manifest: {e}"))
}

/// The named plug of a freshly parsed manifest.
pub(crate) fn plug(manifest: &str, name: &str) -> PlugInfo {
    let info = package(manifest);
    info.plug(name)
        .unwrap_or_else(|| panic!("manifest has no plug {name:?}"))
        .clone()
}

/// The named slot of a freshly parsed manifest.
pub(crate) fn slot(manifest: &str, name: &str) -> SlotInfo {
    let info = package(manifest);
    info.slot(name)
        .unwrap_or_else(|| panic!("manifest has no slot {name:?}"))
        .clone()
}
