use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use nucleus::bridge::HostBridge;
use types::Fault;

/// Raises interrupts on an [`IrqLine`] from anywhere in the host (a timer
/// tick, a serial-bus event). Cheap to clone; all clones share one latch.
#[derive(Debug, Clone, Default)]
pub struct IrqTrigger {
    pending: Rc<Cell<u32>>,
}

impl IrqTrigger {
    /// Latch one more pending interrupt.
    pub fn raise(&self) {
        self.pending.set(self.pending.get() + 1);
    }

    pub fn pending(&self) -> u32 {
        self.pending.get()
    }
}

/// Monitor-side delegation bridge: a pending-interrupt latch plus the host's
/// native handler. The nucleus drains the latch at instruction boundaries,
/// invoking the handler once per latched interrupt.
pub struct IrqLine {
    pending: Rc<Cell<u32>>,
    handler: Box<dyn FnMut()>,
    serviced: u64,
    stop: StopLine,
}

impl IrqLine {
    /// Returns the line and the trigger its interrupt sources raise.
    pub fn new(handler: Box<dyn FnMut()>) -> (Self, IrqTrigger) {
        let trigger = IrqTrigger::default();
        let line = Self {
            pending: Rc::clone(&trigger.pending),
            handler,
            serviced: 0,
            stop: StopLine::default(),
        };
        (line, trigger)
    }

    /// Attach a shell cancellation line to this bridge.
    pub fn with_stop(mut self, stop: StopLine) -> Self {
        self.stop = stop;
        self
    }

    /// How many interrupts have been delegated so far.
    pub fn serviced(&self) -> u64 {
        self.serviced
    }
}

impl fmt::Debug for IrqLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqLine")
            .field("pending", &self.pending.get())
            .field("serviced", &self.serviced)
            .finish()
    }
}

impl HostBridge for IrqLine {
    fn interrupt_pending(&mut self) -> bool {
        self.pending.get() > 0
    }

    fn delegate(&mut self) {
        self.pending.set(self.pending.get() - 1);
        (self.handler)();
        self.serviced += 1;
    }

    fn injected_fault(&mut self) -> Option<Fault> {
        self.stop.take()
    }
}

/// Shell-side cancellation: park a fault here and the run aborts with it at
/// the next instruction boundary (the only legal preemption point). Clones
/// share the request slot, so the shell keeps one and the bridge another.
#[derive(Debug, Clone, Default)]
pub struct StopLine {
    requested: Rc<RefCell<Option<Fault>>>,
}

impl StopLine {
    /// Ask the nucleus to abort with `fault`.
    pub fn request(&self, fault: Fault) {
        *self.requested.borrow_mut() = Some(fault);
    }

    fn take(&self) -> Option<Fault> {
        self.requested.borrow_mut().take()
    }
}

impl HostBridge for StopLine {
    fn injected_fault(&mut self) -> Option<Fault> {
        self.take()
    }
}
