//! Line watcher
//!
//! Watches one digital input line and reports every logical transition
//! through a user callback, once per transition, in the order they
//! occurred. Lines with a hardware edge interrupt are captured
//! asynchronously through a dispatch slot; lines without one fall back to
//! sampling the level on every step.
//!
//! The two capture paths differ in fidelity: an interrupt-driven line
//! replays every edge, including pairs that cancel out in net level, while
//! a sampled line can surface at most one toggle per step (faster bursts
//! coalesce into the net transition, or into nothing).

use linewatch_hal::gpio::{InputPin, PinId};
use linewatch_hal::irq::{EdgeIrq, IrqLine};

use crate::capture::LineMonitor;
use crate::dispatch::{self, DispatchFull, SlotHandle};
use crate::step::Steppable;

/// Opaque user value echoed with every callback of the token variant.
pub type Token = usize;

/// Change callback.
pub type ChangeFn<P, C> = fn(&LineWatcher<P, C>, bool);

/// Change callback carrying user data.
pub type ChangeTokenFn<P, C> = fn(&LineWatcher<P, C>, bool, Token);

/// Active handler for one watcher. Exactly one variant per instance.
enum Callback<P: 'static, C: EdgeIrq> {
    State(ChangeFn<P, C>),
    StateWithToken(ChangeTokenFn<P, C>, Token),
}

impl<P: 'static, C: EdgeIrq> Clone for Callback<P, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P: 'static, C: EdgeIrq> Copy for Callback<P, C> {}

/// Watches one input line and reports its transitions.
///
/// Construction decides the capture path once, from whether the platform
/// routes an edge interrupt to the pin; the choice never changes for the
/// lifetime of the watcher.
pub struct LineWatcher<P: 'static, C: EdgeIrq> {
    /// Pin plus the capture state shared with interrupt context
    monitor: &'static LineMonitor<P>,
    /// Interrupt controller, kept for detaching on drop
    irq: C,
    /// Interrupt line routed to this pin (None = sampled on step)
    line: Option<IrqLine>,
    /// Dispatch slot holding the armed route
    slot: Option<SlotHandle>,
    /// User callback, invoked once per reported transition
    callback: Callback<P, C>,
    /// Last level reported to the callback
    sync_level: bool,
    /// Edge count the callback has been caught up to
    sync_edges: u32,
}

impl<P: InputPin + Sync + 'static, C: EdgeIrq> LineWatcher<P, C> {
    /// Watch `monitor`'s line, reporting each transition to `on_change`.
    ///
    /// Fails only when the line has an interrupt route but every dispatch
    /// slot is already bound.
    pub fn new(
        monitor: &'static LineMonitor<P>,
        irq: C,
        on_change: ChangeFn<P, C>,
    ) -> Result<Self, DispatchFull> {
        Self::build(monitor, irq, Callback::State(on_change))
    }

    /// Like [`new`](Self::new), additionally echoing `token` with every
    /// report.
    pub fn with_token(
        monitor: &'static LineMonitor<P>,
        irq: C,
        on_change: ChangeTokenFn<P, C>,
        token: Token,
    ) -> Result<Self, DispatchFull> {
        Self::build(monitor, irq, Callback::StateWithToken(on_change, token))
    }

    fn build(
        monitor: &'static LineMonitor<P>,
        irq: C,
        callback: Callback<P, C>,
    ) -> Result<Self, DispatchFull> {
        let level = monitor.level();
        let (line, slot) = match irq.line_for(monitor.pin_id()) {
            Some(line) => {
                // One synthetic edge so the first step reports the line's
                // starting state without a physical transition.
                monitor.cell().seed(level);
                let slot = dispatch::bind(monitor)?;
                irq.attach(line, slot.entry());
                (Some(line), Some(slot))
            }
            None => (None, None),
        };
        Ok(Self {
            monitor,
            irq,
            line,
            slot,
            callback,
            // Starting from the negated level makes the forced first
            // report come out as the true level, in both capture paths.
            sync_level: !level,
            sync_edges: 0,
        })
    }

    /// Last reported logical state of the line.
    pub fn state(&self) -> bool {
        self.sync_level
    }

    /// Pin number of the watched line.
    pub fn pin(&self) -> PinId {
        self.monitor.pin_id()
    }

    /// Whether edges are captured by a hardware interrupt rather than
    /// sampled during [`step`](Steppable::step).
    pub fn captures_via_interrupt(&self) -> bool {
        self.line.is_some()
    }
}

impl<P: InputPin + Sync + 'static, C: EdgeIrq> Steppable for LineWatcher<P, C> {
    /// Reconcile with the capture side and deliver pending reports.
    fn step(&mut self) {
        let edges = match self.line {
            Some(_) => self.monitor.cell().snapshot().edges,
            None => {
                let level = self.monitor.level();
                if level == self.sync_level {
                    self.sync_edges
                } else {
                    // A sampled line surfaces at most one toggle per step.
                    self.sync_edges.wrapping_add(1)
                }
            }
        };
        let pending = edges.wrapping_sub(self.sync_edges);
        if pending == 0 {
            return;
        }
        // Replay each toggle individually, oldest first. The level is
        // recomputed by negation on every unit so that pairs of edges
        // cancelling in net level still get their own reports.
        let callback = self.callback;
        for _ in 0..pending {
            self.sync_level = !self.sync_level;
            match callback {
                Callback::State(f) => f(self, self.sync_level),
                Callback::StateWithToken(f, token) => f(self, self.sync_level, token),
            }
        }
        self.sync_edges = edges;
    }
}

/// Disarms the interrupt route, if one was armed.
///
/// Callers must make sure no edge interrupt for this line can be delivered
/// while the watcher is dropped, e.g. by masking interrupts around
/// teardown. A stale route that fires anyway after the drop finds its
/// dispatch slot empty and does nothing.
impl<P: 'static, C: EdgeIrq> Drop for LineWatcher<P, C> {
    fn drop(&mut self) {
        if let Some(line) = self.line.take() {
            self.irq.detach(line);
        }
        if let Some(slot) = self.slot.take() {
            dispatch::unbind(slot);
        }
    }
}
