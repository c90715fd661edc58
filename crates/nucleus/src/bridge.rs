use std::fmt::Debug;

use log::trace;
use types::Fault;

use crate::cpu::GuestCpu;

/// Host side of the interrupt delegation bridge.
///
/// The nucleus polls this at every instruction boundary (between one fully
/// completed instruction's effects and the next fetch) and never anywhere
/// else. A pending host interrupt is delegated to the host's native handler
/// with guest execution suspended; from the guest's point of view the
/// interrupt was deferred to exactly that boundary.
pub trait HostBridge: Debug {
    /// Whether a host hardware interrupt is pending right now.
    fn interrupt_pending(&mut self) -> bool {
        false
    }

    /// Run the host's native handler for the pending interrupt, exactly as
    /// if it had fired in ordinary host-native code. Must return once the
    /// handler is done; the guest resumes immediately after.
    fn delegate(&mut self) {}

    /// A fault the loader/shell wants injected at the next boundary. This is
    /// the only way to stop a run from outside: there is no mid-instruction
    /// cancellation.
    fn injected_fault(&mut self) -> Option<Fault> {
        None
    }
}

/// Bridge that never interrupts and never cancels.
#[derive(Debug, Default)]
pub struct NoopBridge;

impl HostBridge for NoopBridge {}

/// Drain every pending interrupt at a boundary, delegating each to the host
/// handler while keeping the guest record intact.
///
/// The guest CPU state is captured before the handler runs and written back
/// verbatim afterwards: the handler has its usual host-native freedom but no
/// window into, or out of, guest registers. Looping here means back-to-back
/// interrupts are all serviced before the next fetch.
pub(crate) fn service_pending(bridge: &mut dyn HostBridge, cpu: &mut GuestCpu) {
    while bridge.interrupt_pending() {
        let snapshot = cpu.clone();
        bridge.delegate();
        *cpu = snapshot;
        trace!("delegated host interrupt at pc=0x{:08x}", cpu.pc);
    }
}
