//! Built-in interfaces.

mod gpio;
mod udisks2;

pub use gpio::GpioInterface;
pub use udisks2::UDisks2Interface;

use crate::interface::Interface;
use std::sync::Arc;

/// Every built-in interface, in registration order.
pub fn interfaces() -> Vec<Arc<dyn Interface>> {
    vec![Arc::new(GpioInterface), Arc::new(UDisks2Interface)]
}
