//! Interface error types.

use thiserror::Error;

/// Broad class of an [`Error`].
///
/// Callers use this to decide what to do with a failure: validation errors
/// reject a package before anything is compiled, registration errors are
/// fatal at startup, compilation errors abort a single backend pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Registration,
    Compilation,
    Metadata,
}

/// Interface errors.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A declaration lacks an attribute its interface requires.
    #[error("{interface} {side} must have a {attr} attribute")]
    MissingAttribute {
        interface: String,
        side: Side,
        attr: String,
    },

    /// A declaration attribute has the wrong value type.
    #[error("{interface} {side} {attr} attribute must be {expected}")]
    AttributeType {
        interface: String,
        side: Side,
        attr: String,
        expected: &'static str,
    },

    /// A declaration attribute has the right type but an unacceptable value.
    #[error("{interface} {side} {attr} attribute {reason}")]
    InvalidAttribute {
        interface: String,
        side: Side,
        attr: String,
        reason: String,
    },

    /// The declaring package is not allowed to provide this interface.
    #[error("{interface} {side}s are reserved for the core and gadget snaps")]
    Reserved { interface: String, side: Side },

    /// A declaration was checked against a contract of another interface.
    #[error("cannot sanitize {side} {name:?} (interface {declared:?}) using interface {used:?}")]
    WrongInterface {
        side: Side,
        name: String,
        declared: String,
        used: String,
    },

    /// Two contracts claim the same interface name.
    #[error("cannot register duplicate interface {0:?}")]
    DuplicateInterface(String),

    /// No contract is registered under this interface name.
    #[error("unknown interface {0:?}")]
    UnknownInterface(String),

    /// A plug and a slot of different interfaces were paired.
    #[error("cannot connect plug {plug:?} (interface {plug_interface:?}) to slot {slot:?} (interface {slot_interface:?})")]
    InterfaceMismatch {
        plug: String,
        plug_interface: String,
        slot: String,
        slot_interface: String,
    },

    /// An attribute needed while compiling a connection is absent or mistyped.
    #[error("snap {package:?} does not have attribute {attr:?} for interface {interface:?}")]
    MissingConnectionAttribute {
        package: String,
        attr: String,
        interface: String,
    },

    /// An attribute needed while compiling a connection has the wrong type.
    #[error("snap {package:?} attribute {attr:?} for interface {interface:?} must be {expected}")]
    ConnectionAttributeType {
        package: String,
        attr: String,
        interface: String,
        expected: &'static str,
    },

    /// An attribute needed while compiling a connection has an unusable value.
    #[error("snap {package:?} attribute {attr:?} for interface {interface:?} {reason}")]
    InvalidConnectionAttribute {
        package: String,
        attr: String,
        interface: String,
        reason: String,
    },

    /// Two contributions want different units under the same name.
    #[error("interface {interface:?} has conflicting definitions of service {service:?}")]
    ConflictingService { interface: String, service: String },

    /// A package manifest could not be understood.
    #[error("invalid package manifest: {0}")]
    Manifest(String),

    /// An I/O error occurred while reading a manifest.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns the class this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingAttribute { .. }
            | Error::AttributeType { .. }
            | Error::InvalidAttribute { .. }
            | Error::Reserved { .. }
            | Error::WrongInterface { .. } => ErrorKind::Validation,
            Error::DuplicateInterface(_) | Error::UnknownInterface(_) => ErrorKind::Registration,
            Error::InterfaceMismatch { .. }
            | Error::MissingConnectionAttribute { .. }
            | Error::ConnectionAttributeType { .. }
            | Error::InvalidConnectionAttribute { .. }
            | Error::ConflictingService { .. } => ErrorKind::Compilation,
            Error::Manifest(_) | Error::Io(_) => ErrorKind::Metadata,
        }
    }
}

/// Which end of a connection a declaration sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Plug,
    Slot,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Plug => f.write_str("plug"),
            Side::Slot => f.write_str("slot"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
