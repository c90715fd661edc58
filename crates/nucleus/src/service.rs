use std::fmt::Debug;

use log::warn;
use types::Fault;

use crate::cpu::{GuestCpu, Step};
use crate::instruction::ECALL_WORD;
use crate::registers::Register;
use crate::window::GuestMemory;

/// The reserved host-service call surface, dispatched on ECALL.
///
/// How guest code reaches screen, sound, or disk resources is deliberately
/// left open; this trait is the delimited extension point a future service
/// layer plugs into. The register convention is fixed now so guests and the
/// future layer can agree on it: a7 selects the service, a0-a5 carry
/// arguments, a0 carries the result.
pub trait ServiceHandler: Debug {
    fn handle(&mut self, cpu: &mut GuestCpu, memory: &GuestMemory) -> Result<Step, Fault>;
}

/// The shipped surface: reserved but unimplemented. Every call is refused,
/// so no guest binary can grow a dependency on accidental semantics before
/// the real layer exists.
#[derive(Debug, Default)]
pub struct UnimplementedServices;

impl ServiceHandler for UnimplementedServices {
    fn handle(&mut self, cpu: &mut GuestCpu, _memory: &GuestMemory) -> Result<Step, Fault> {
        warn!(
            "guest ECALL (a7={}) at pc=0x{:08x}, but no host-service surface is installed",
            cpu.read_reg(Register::A7 as usize),
            cpu.pc
        );
        Err(Fault::IllegalInstruction { opcode: ECALL_WORD })
    }
}
