use log::trace;
use types::{Fault, PrivilegeMode, RunOutcome};

use crate::bridge::{self, HostBridge, NoopBridge};
use crate::cpu::{GuestCpu, Step};
use crate::decoder;
use crate::instruction::EBREAK_WORD;
use crate::registers::Register;
use crate::service::{ServiceHandler, UnimplementedServices};
use crate::trap::RunState;
use crate::window::GuestMemory;

/// Loader-supplied conventions for a run.
#[derive(Debug, Clone, Copy)]
pub struct NucleusConfig {
    /// The 32-bit word recognized as the guest halt request, compared
    /// against each fetched word before decoding. A convention between the
    /// loader/shell and its guests, not part of the ISA; the default is the
    /// EBREAK encoding.
    pub halt_word: u32,

    /// Privilege mode for the whole run.
    pub mode: PrivilegeMode,
}

impl Default for NucleusConfig {
    fn default() -> Self {
        Self {
            halt_word: EBREAK_WORD,
            mode: PrivilegeMode::User,
        }
    }
}

/// One guest program's fetch-decode-execute loop, together with its CPU
/// state, its memory window, the delegation bridge, and the reserved service
/// surface.
#[derive(Debug)]
pub struct Nucleus {
    pub cpu: GuestCpu,
    pub memory: GuestMemory,
    state: RunState,
    config: NucleusConfig,
    bridge: Box<dyn HostBridge>,
    services: Box<dyn ServiceHandler>,
}

impl Nucleus {
    /// `entry` is the initial program counter; `initial_sp` is the
    /// stack/argument register value the shell assembled (seeded into sp).
    /// The memory handle must already hold the loaded program image.
    pub fn new(memory: GuestMemory, entry: u32, initial_sp: u32, config: NucleusConfig) -> Self {
        let mut cpu = GuestCpu::new(config.mode);
        cpu.pc = entry;
        cpu.write_reg(Register::Sp as usize, initial_sp);
        Self {
            cpu,
            memory,
            state: RunState::Running,
            config,
            bridge: Box::new(NoopBridge),
            services: Box::new(UnimplementedServices),
        }
    }

    pub fn with_bridge(mut self, bridge: Box<dyn HostBridge>) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn with_services(mut self, services: Box<dyn ServiceHandler>) -> Self {
        self.services = services;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run to a terminal state and hand back the execution result.
    pub fn run(&mut self) -> RunOutcome {
        loop {
            if let Some(outcome) = self.state.outcome() {
                return outcome;
            }
            self.step();
        }
    }

    /// One instruction boundary plus one instruction.
    ///
    /// Boundary work comes first: pending host interrupts are drained
    /// through the bridge, then a loader-injected fault (the cancellation
    /// path) is honored. Only then does the next fetch happen. Once the run
    /// is terminal this is a no-op.
    pub fn step(&mut self) {
        if self.state.is_terminal() {
            return;
        }

        bridge::service_pending(self.bridge.as_mut(), &mut self.cpu);
        if let Some(fault) = self.bridge.injected_fault() {
            self.state.abort(fault, self.cpu.pc);
            return;
        }

        match self.step_instruction() {
            Ok(Step::Continue) => {}
            Ok(Step::Halt { status }) => self.state.halt(status),
            Err(fault) => self.state.abort(fault, self.cpu.pc),
        }
    }

    fn step_instruction(&mut self) -> Result<Step, Fault> {
        let word = self.memory.fetch_word(self.cpu.pc)?;

        // The halt word is a loader convention, not necessarily a valid
        // encoding; it is recognized before decode.
        if word == self.config.halt_word {
            return Ok(Step::Halt {
                status: self.cpu.read_reg(Register::A0 as usize),
            });
        }

        let instr =
            decoder::decode(word).ok_or(Fault::IllegalInstruction { opcode: word })?;
        trace!("pc=0x{:08x}  {}", self.cpu.pc, instr.pretty_print());

        let old_pc = self.cpu.pc;
        let step = self
            .cpu
            .execute(instr, &self.memory, self.services.as_mut())?;

        // Control transfers set the PC themselves; everything else falls
        // through to the next sequential instruction.
        if self.cpu.pc == old_pc {
            self.cpu.pc = self.cpu.pc.wrapping_add(4);
        }
        Ok(step)
    }
}
