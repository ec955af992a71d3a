//! Interrupt dispatch slots
//!
//! Interrupt controllers accept a bare `fn()` as the service routine, and a
//! `fn()` cannot capture the object it should notify. The slot table closes
//! that gap: [`bind`] stores a `&'static dyn EdgeHandler` and hands back a
//! claim on the entry point generated for that slot; when the hardware
//! fires the entry point, it looks its handler back up and forwards the
//! call.
//!
//! Entry points exist for every slot ahead of time (one monomorphized
//! function per index), so the address handed to the controller is known at
//! bind time. The table itself must be a `static` for the entry points to
//! reach it; binding is fallible and slots are reclaimed on [`unbind`], so
//! [`DISPATCH_SLOTS`] only bounds *simultaneously armed* routes.

use core::cell::Cell;

use critical_section::Mutex;
use linewatch_hal::irq::RawIsr;

/// Number of simultaneously bound interrupt routes.
pub const DISPATCH_SLOTS: usize = 8;

/// Recipient of an edge notification from interrupt context.
pub trait EdgeHandler: Sync {
    /// Called once per hardware edge.
    fn on_edge(&self);
}

type Slot = Mutex<Cell<Option<&'static dyn EdgeHandler>>>;

#[allow(clippy::declare_interior_mutable_const)]
const FREE: Slot = Mutex::new(Cell::new(None));

static SLOTS: [Slot; DISPATCH_SLOTS] = [FREE; DISPATCH_SLOTS];

/// Entry point monomorphized per slot index.
///
/// The handler is fetched inside a critical section but invoked outside
/// it, so user code never runs with further edges held off. An empty slot
/// is a silent no-op: a stale route left armed on the platform cannot
/// reach an unbound handler.
fn entry<const SLOT: usize>() {
    let handler = critical_section::with(|cs| SLOTS[SLOT].borrow(cs).get());
    if let Some(handler) = handler {
        handler.on_edge();
    }
}

static ENTRIES: [RawIsr; DISPATCH_SLOTS] = [
    entry::<0>,
    entry::<1>,
    entry::<2>,
    entry::<3>,
    entry::<4>,
    entry::<5>,
    entry::<6>,
    entry::<7>,
];

/// Every dispatch slot is occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchFull;

/// Claim on one dispatch slot. Returned by [`bind`]; release with
/// [`unbind`].
#[derive(Debug)]
pub struct SlotHandle {
    index: u8,
}

impl SlotHandle {
    /// The zero-argument entry point routed to this slot.
    pub fn entry(&self) -> RawIsr {
        ENTRIES[self.index as usize]
    }
}

/// Store `handler` in the first free slot.
pub fn bind(handler: &'static dyn EdgeHandler) -> Result<SlotHandle, DispatchFull> {
    critical_section::with(|cs| {
        for (index, slot) in SLOTS.iter().enumerate() {
            let cell = slot.borrow(cs);
            if cell.get().is_none() {
                cell.set(Some(handler));
                return Ok(SlotHandle { index: index as u8 });
            }
        }
        Err(DispatchFull)
    })
}

/// Free the slot. Its entry point becomes a no-op until bound again.
pub fn unbind(handle: SlotHandle) {
    critical_section::with(|cs| SLOTS[handle.index as usize].borrow(cs).set(None));
}

/// The dispatch table is process-global; tests that touch it hold this
/// lock so they cannot observe each other's slots.
#[cfg(test)]
pub(crate) fn test_guard() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::{Mutex as StdMutex, OnceLock};

    static GUARD: OnceLock<StdMutex<()>> = OnceLock::new();
    GUARD
        .get_or_init(|| StdMutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicU32, Ordering};

    use std::vec::Vec;

    use super::*;

    struct CountingHandler {
        hits: AtomicU32,
    }

    impl CountingHandler {
        const fn new() -> Self {
            Self {
                hits: AtomicU32::new(0),
            }
        }

        fn hits(&self) -> u32 {
            self.hits.load(Ordering::SeqCst)
        }
    }

    impl EdgeHandler for CountingHandler {
        fn on_edge(&self) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_entries_route_to_their_own_handler() {
        let _guard = test_guard();

        static A: CountingHandler = CountingHandler::new();
        static B: CountingHandler = CountingHandler::new();
        static C: CountingHandler = CountingHandler::new();

        let a = bind(&A).unwrap();
        let b = bind(&B).unwrap();
        let c = bind(&C).unwrap();

        // Invocation order is independent of bind order.
        (c.entry())();
        (a.entry())();
        (c.entry())();
        (b.entry())();

        assert_eq!(A.hits(), 1);
        assert_eq!(B.hits(), 1);
        assert_eq!(C.hits(), 2);

        unbind(a);
        unbind(b);
        unbind(c);
    }

    #[test]
    fn test_bind_fails_when_full_and_recovers_after_unbind() {
        let _guard = test_guard();

        static H: CountingHandler = CountingHandler::new();

        let mut handles = Vec::new();
        for _ in 0..DISPATCH_SLOTS {
            handles.push(bind(&H).unwrap());
        }
        assert_eq!(bind(&H).unwrap_err(), DispatchFull);

        unbind(handles.pop().unwrap());
        handles.push(bind(&H).unwrap());

        for handle in handles {
            unbind(handle);
        }
    }

    #[test]
    fn test_unbound_entry_is_silent() {
        let _guard = test_guard();

        static H: CountingHandler = CountingHandler::new();

        let handle = bind(&H).unwrap();
        let stale = handle.entry();
        unbind(handle);

        stale();
        assert_eq!(H.hits(), 0);
    }
}
