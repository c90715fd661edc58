//! Interrupt delegation transparency: host interrupts interposed at
//! instruction boundaries never change guest-visible state, and the
//! loader's injected-fault path stops a run only at a boundary.


use std::cell::Cell;
use std::rc::Rc;

use nucleus::bridge::HostBridge;
use nucleus::cpu::GuestCpu;
use types::{AccessKind, Fault, RunOutcome};

/// Countdown loop: x1 runs 10..0, x2 counts iterations, status from a0.
fn loop_program() -> Vec<u32> {
    vec![
        asm::addi(1, 0, 10),
        asm::addi(2, 0, 0),
        asm::addi(1, 1, -1), // loop:
        asm::addi(2, 2, 1),
        asm::bne(1, 0, -8), // to loop
        asm::addi(10, 2, 0),
        asm::ebreak(),
    ]
}

/// Raises exactly one interrupt at each listed instruction boundary. The
/// handler mutates host-side state only, as a real native handler would.
#[derive(Debug)]
struct ScheduledIrqs {
    fire_at: Vec<usize>,
    boundary: usize,
    draining: bool,
    serviced: Rc<Cell<u32>>,
    host_ticks: Rc<Cell<u32>>,
}

impl ScheduledIrqs {
    fn new(fire_at: Vec<usize>, serviced: Rc<Cell<u32>>, host_ticks: Rc<Cell<u32>>) -> Self {
        Self {
            fire_at,
            boundary: 0,
            draining: false,
            serviced,
            host_ticks,
        }
    }
}

impl HostBridge for ScheduledIrqs {
    fn interrupt_pending(&mut self) -> bool {
        if self.draining {
            // Re-poll after a delegation: this boundary is drained.
            self.draining = false;
            return false;
        }
        self.boundary += 1;
        if self.fire_at.contains(&(self.boundary - 1)) {
            self.draining = true;
            return true;
        }
        false
    }

    fn delegate(&mut self) {
        // The host's timer handler: bumps a host counter, nothing else.
        self.host_ticks.set(self.host_ticks.get() + 1);
        self.serviced.set(self.serviced.get() + 1);
    }
}

fn run_with_irqs(fire_at: Vec<usize>) -> (GuestCpu, RunOutcome, u32, u32) {
    let serviced = Rc::new(Cell::new(0));
    let host_ticks = Rc::new(Cell::new(0));
    let bridge = ScheduledIrqs::new(fire_at, Rc::clone(&serviced), Rc::clone(&host_ticks));

    let mut n = asm::boot(&loop_program()).with_bridge(Box::new(bridge));
    let outcome = n.run();
    (n.cpu.clone(), outcome, serviced.get(), host_ticks.get())
}

#[test]
fn interrupts_are_invisible_to_the_guest() {
    let (baseline_cpu, baseline_outcome, serviced, _) = run_with_irqs(vec![]);
    assert_eq!(serviced, 0);
    assert_eq!(baseline_outcome, RunOutcome::Halted { status: 10 });

    // One interrupt, several interrupts, interrupts on consecutive
    // boundaries: the guest record must come out bit-identical.
    for fire_at in [vec![1], vec![0, 5, 9, 17], (0..30).collect::<Vec<_>>()] {
        let expected = fire_at.len() as u32;
        let (cpu, outcome, serviced, host_ticks) = run_with_irqs(fire_at);
        assert_eq!(outcome, baseline_outcome);
        assert_eq!(cpu, baseline_cpu);
        assert_eq!(serviced, expected);
        assert_eq!(host_ticks, expected);
    }
}

/// Shared latch the test raises between manual steps, like a hardware line.
#[derive(Debug, Default)]
struct LatchedIrqs {
    pending: Rc<Cell<u32>>,
    serviced: Rc<Cell<u32>>,
}

impl HostBridge for LatchedIrqs {
    fn interrupt_pending(&mut self) -> bool {
        self.pending.get() > 0
    }

    fn delegate(&mut self) {
        self.pending.set(self.pending.get() - 1);
        self.serviced.set(self.serviced.get() + 1);
    }
}

#[test]
fn back_to_back_interrupts_drain_before_the_next_fetch() {
    let pending = Rc::new(Cell::new(0));
    let serviced = Rc::new(Cell::new(0));
    let bridge = LatchedIrqs {
        pending: Rc::clone(&pending),
        serviced: Rc::clone(&serviced),
    };

    let mut n = asm::boot(&loop_program()).with_bridge(Box::new(bridge));

    n.step();
    // Three interrupts latched while the guest was "between" instructions.
    pending.set(3);
    n.step();
    assert_eq!(serviced.get(), 3);
    assert_eq!(pending.get(), 0);

    let outcome = n.run();
    assert_eq!(outcome, RunOutcome::Halted { status: 10 });
}

/// Injects a fault at one boundary, the way a shell cancels a run.
#[derive(Debug)]
struct InjectAt {
    boundary: usize,
    seen: usize,
    fault: Fault,
}

impl HostBridge for InjectAt {
    fn injected_fault(&mut self) -> Option<Fault> {
        self.seen += 1;
        if self.seen - 1 == self.boundary {
            Some(self.fault)
        } else {
            None
        }
    }
}

#[test]
fn injected_fault_aborts_at_the_next_boundary() {
    let fault = Fault::OutOfRangeAccess {
        kind: AccessKind::Fetch,
        addr: 0,
        width: 4,
    };
    let mut n = asm::boot(&loop_program()).with_bridge(Box::new(InjectAt {
        boundary: 4,
        seen: 0,
        fault,
    }));

    let outcome = n.run();
    // Four instructions completed, then the boundary check stopped the run
    // with the injected fault and the guest record intact.
    assert_eq!(
        outcome,
        RunOutcome::Aborted {
            fault,
            pc: n.cpu.pc
        }
    );
    assert_eq!(n.cpu.regs[1], 9); // first decrement done
    assert_eq!(n.cpu.regs[2], 1); // first iteration counted
}

#[test]
fn injection_never_preempts_mid_instruction() {
    // A bridge that always wants to cancel still only stops before the next
    // fetch: the first instruction's effects are whole.
    #[derive(Debug)]
    struct AlwaysCancel;
    impl HostBridge for AlwaysCancel {
        fn injected_fault(&mut self) -> Option<Fault> {
            Some(Fault::IllegalInstruction { opcode: 0 })
        }
    }

    let mut n = asm::boot(&loop_program()).with_bridge(Box::new(AlwaysCancel));
    let outcome = n.run();
    assert_eq!(
        outcome,
        RunOutcome::Aborted {
            fault: Fault::IllegalInstruction { opcode: 0 },
            pc: n.cpu.pc,
        }
    );
    // Cancelled at the very first boundary: nothing executed at all.
    assert_eq!(n.cpu.regs[1], 0);
    assert_eq!(n.cpu.regs[2], 0);
}
