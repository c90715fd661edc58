//! Virtualized CSR space.
//!
//! No CSR is backed by storage; behavior depends only on the privilege mode.
//! User-mode guests may probe or defensively clear machine CSRs: every read
//! yields zero and every write is discarded, for all 4096 indices alike.
//! Supervisor-mode CSR access is refused: code that expects CSR side
//! effects should not be running as a guest workload, and letting it read
//! zeros would have it miscompute silently.

use types::{Fault, PrivilegeMode};

/// Read `csr`. Always zero in user mode; a fault in supervisor mode.
pub fn read(mode: PrivilegeMode, csr: u16) -> Result<u32, Fault> {
    match mode {
        PrivilegeMode::User => Ok(0),
        PrivilegeMode::Supervisor => Err(Fault::IllegalCsrAccess { csr }),
    }
}

/// Write `csr`. Discarded without any state change in user mode; a fault in
/// supervisor mode.
pub fn write(mode: PrivilegeMode, csr: u16, _value: u32) -> Result<(), Fault> {
    match mode {
        PrivilegeMode::User => Ok(()),
        PrivilegeMode::Supervisor => Err(Fault::IllegalCsrAccess { csr }),
    }
}
