use log::debug;
use types::{Fault, RunOutcome};

/// Lifecycle of one guest run. `Running` is the only state that executes;
/// `Halted` and `Aborted` are terminal and final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Halted { status: u32 },
    Aborted { fault: Fault, pc: u32 },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Running)
    }

    /// Terminal transition on a fault. Guest memory and registers are left
    /// exactly as they stood at this point; the loader/shell reads them for
    /// its diagnostic.
    pub(crate) fn abort(&mut self, fault: Fault, pc: u32) {
        if let RunState::Running = self {
            debug!("guest aborted at pc=0x{:08x}: {}", pc, fault);
            *self = RunState::Aborted { fault, pc };
        }
    }

    /// Terminal transition on the guest's halt request.
    pub(crate) fn halt(&mut self, status: u32) {
        if let RunState::Running = self {
            debug!("guest halted with status {}", status);
            *self = RunState::Halted { status };
        }
    }

    /// The execution result, once a terminal state is reached.
    pub fn outcome(&self) -> Option<RunOutcome> {
        match *self {
            RunState::Running => None,
            RunState::Halted { status } => Some(RunOutcome::Halted { status }),
            RunState::Aborted { fault, pc } => Some(RunOutcome::Aborted { fault, pc }),
        }
    }
}
