//! Edge interrupt routing
//!
//! Interrupt controllers on the supported platforms accept a bare
//! zero-argument function as the service routine; [`RawIsr`] models that
//! calling convention and [`EdgeIrq`] the controller that arms it.

use crate::gpio::PinId;

/// Identifier of an edge-capture interrupt line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqLine(pub u8);

/// Zero-argument interrupt entry point, as accepted by the controller.
pub type RawIsr = fn();

/// Edge interrupt controller
///
/// Implementations route an entry point to a pin's edge interrupt.
/// [`attach`](EdgeIrq::attach) arms the route for both rising and falling
/// edges; the controller fires it once per genuine transition.
pub trait EdgeIrq {
    /// Interrupt line assigned to `pin`, if the platform has one for it.
    fn line_for(&self, pin: PinId) -> Option<IrqLine>;

    /// Arm `entry` to run on every edge of `line`.
    fn attach(&self, line: IrqLine, entry: RawIsr);

    /// Disarm whatever is attached to `line`.
    fn detach(&self, line: IrqLine);
}

impl<T: EdgeIrq> EdgeIrq for &T {
    fn line_for(&self, pin: PinId) -> Option<IrqLine> {
        (**self).line_for(pin)
    }

    fn attach(&self, line: IrqLine, entry: RawIsr) {
        (**self).attach(line, entry)
    }

    fn detach(&self, line: IrqLine) {
        (**self).detach(line)
    }
}
