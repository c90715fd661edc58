use core::fmt;

use thiserror::Error;

/// The kind of guest memory reference being arbitrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Fetch,
    Load,
    Store,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessKind::Fetch => write!(f, "fetch"),
            AccessKind::Load => write!(f, "load"),
            AccessKind::Store => write!(f, "store"),
        }
    }
}

/// Conditions fatal to a guest run.
///
/// There is no guest-level recovery and no emulated trap vector: each of
/// these ends the run immediately, before any partial side effect, and is
/// reported back to the loader/shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Fault {
    /// A fetch, load, or store where at least one byte of the accessed span
    /// falls outside the guest window.
    #[error("{kind} of {width} byte(s) at 0x{addr:08x} outside the guest window")]
    OutOfRangeAccess {
        kind: AccessKind,
        addr: u32,
        width: u8,
    },

    /// The fetched 32-bit word is not a defined RV32I base encoding.
    #[error("illegal instruction encoding 0x{opcode:08x}")]
    IllegalInstruction { opcode: u32 },

    /// A CSR instruction issued outside user mode.
    #[error("CSR 0x{csr:03x} accessed in supervisor mode")]
    IllegalCsrAccess { csr: u16 },
}
