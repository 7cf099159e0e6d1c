//! Interface contracts and the multi-backend security specification compiler.
//!
//! Packages declare **plugs** (capabilities they consume) and **slots**
//! (capabilities they provide). Each interface validates those declarations
//! and, once a plug is connected to a slot, contributes confinement policy to
//! five backends: AppArmor, seccomp, D-Bus, udev and systemd.
//!
//! ```no_run
//! use interfaces::{CompileInput, Compiler, Connection, PackageInfo, Registry};
//!
//! # fn main() -> interfaces::Result<()> {
//! let registry = Registry::builtin()?;
//! let gadget = PackageInfo::load("gadget.toml")?;
//! let app = PackageInfo::load("app.toml")?;
//! registry.sanitize_package(&gadget)?;
//! registry.sanitize_package(&app)?;
//!
//! let input = CompileInput::new().with_connection(Connection::between(
//!     app.plug("gpio").unwrap(),
//!     gadget.slot("pin").unwrap(),
//! )?);
//! let compiled = Compiler::new(&registry).compile_all(&input)?;
//! # let _ = compiled;
//! # Ok(())
//! # }
//! ```

mod attrs;
pub mod backend;
pub mod builtin;
mod compiler;
mod connection;
mod error;
mod interface;
mod label;
mod manifest;
mod package;
mod registry;

#[cfg(test)]
mod testutil;

pub use attrs::{AttrError, AttrValue, Attributes, Attrs};
pub use backend::{
    AppArmorSpec, Backend, DBusSpec, SeccompSpec, Service, ServiceType, Specification,
    SystemdSpec, UDevSpec,
};
pub use compiler::{CompileInput, Compiled, Compiler, TaggedSnippet};
pub use connection::{ConnectedPlug, ConnectedSlot, Connection};
pub use error::{Error, ErrorKind, Result, Side};
pub use interface::{
    Interface, StaticInfo, reserve_slot_for_core_or_gadget, sanitize_plug, sanitize_slot,
};
pub use label::Label;
pub use package::{
    AppInfo, PackageIdentity, PackageInfo, PackageType, PlugInfo, SlotInfo, security_tag,
};
pub use registry::Registry;
