use std::cell::{Ref, RefCell};
use std::convert::TryInto;
use std::fmt;
use std::rc::Rc;

use types::layout::{GUEST_WINDOW_BASE, GUEST_WINDOW_SIZE, GUEST_WINDOW_TOP};
use types::{AccessKind, Fault};

/// Backing storage for the guest window, with the address confinement
/// arbiter in front of it.
///
/// Every guest fetch, load, and store goes through the accessors here; there
/// is no other path to the backing region. Each access validates its whole
/// byte span against `[GUEST_WINDOW_BASE, GUEST_WINDOW_TOP]` before touching
/// memory, so a rejected access has no side effect, not even a partial one.
///
/// Handles are cheap clones sharing one region. The running nucleus is the
/// only mutator for the lifetime of a run; the loader keeps a handle so it
/// can read diagnostics after a halt or fault.
#[derive(Clone)]
pub struct GuestMemory {
    mem: Rc<RefCell<Vec<u8>>>,
}

impl GuestMemory {
    /// Allocate a zeroed guest window.
    pub fn new() -> Self {
        Self {
            mem: Rc::new(RefCell::new(vec![0u8; GUEST_WINDOW_SIZE])),
        }
    }

    /// Validate that all of the `width`-byte span at `addr` is inside the
    /// window and translate `addr` to an offset into the backing region.
    fn arbitrate(&self, kind: AccessKind, addr: u32, width: u8) -> Result<usize, Fault> {
        // 64-bit end so a span near the top of the address space cannot wrap.
        let end = addr as u64 + width as u64 - 1;
        if addr < GUEST_WINDOW_BASE || end > GUEST_WINDOW_TOP as u64 {
            return Err(Fault::OutOfRangeAccess { kind, addr, width });
        }
        Ok((addr - GUEST_WINDOW_BASE) as usize)
    }

    /// Fetch the 32-bit instruction word at `pc`.
    pub fn fetch_word(&self, pc: u32) -> Result<u32, Fault> {
        let off = self.arbitrate(AccessKind::Fetch, pc, 4)?;
        let mem = self.mem.borrow();
        Ok(u32::from_le_bytes(mem[off..off + 4].try_into().unwrap()))
    }

    pub fn load_u8(&self, addr: u32) -> Result<u8, Fault> {
        let off = self.arbitrate(AccessKind::Load, addr, 1)?;
        Ok(self.mem.borrow()[off])
    }

    pub fn load_u16(&self, addr: u32) -> Result<u16, Fault> {
        let off = self.arbitrate(AccessKind::Load, addr, 2)?;
        let mem = self.mem.borrow();
        Ok(u16::from_le_bytes(mem[off..off + 2].try_into().unwrap()))
    }

    pub fn load_u32(&self, addr: u32) -> Result<u32, Fault> {
        let off = self.arbitrate(AccessKind::Load, addr, 4)?;
        let mem = self.mem.borrow();
        Ok(u32::from_le_bytes(mem[off..off + 4].try_into().unwrap()))
    }

    pub fn store_u8(&self, addr: u32, value: u8) -> Result<(), Fault> {
        let off = self.arbitrate(AccessKind::Store, addr, 1)?;
        self.mem.borrow_mut()[off] = value;
        Ok(())
    }

    pub fn store_u16(&self, addr: u32, value: u16) -> Result<(), Fault> {
        let off = self.arbitrate(AccessKind::Store, addr, 2)?;
        self.mem.borrow_mut()[off..off + 2].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn store_u32(&self, addr: u32, value: u32) -> Result<(), Fault> {
        let off = self.arbitrate(AccessKind::Store, addr, 4)?;
        self.mem.borrow_mut()[off..off + 4].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Host-side helper: copy `bytes` into the window at `addr`. Returns
    /// false, writing nothing, if any byte of the span leaves the window.
    /// This is the loader's path for placing a program image; it is not
    /// reachable from guest instructions.
    pub fn write_bytes(&self, addr: u32, bytes: &[u8]) -> bool {
        if bytes.is_empty() {
            return true;
        }
        let end = addr as u64 + bytes.len() as u64 - 1;
        if addr < GUEST_WINDOW_BASE || end > GUEST_WINDOW_TOP as u64 {
            return false;
        }
        let off = (addr - GUEST_WINDOW_BASE) as usize;
        self.mem.borrow_mut()[off..off + bytes.len()].copy_from_slice(bytes);
        true
    }

    /// Bounds-checked read-only view of window contents, for diagnostics.
    pub fn view(&self, addr: u32, len: usize) -> Option<Ref<[u8]>> {
        if len == 0 {
            return None;
        }
        let end = addr as u64 + len as u64 - 1;
        if addr < GUEST_WINDOW_BASE || end > GUEST_WINDOW_TOP as u64 {
            return None;
        }
        let off = (addr - GUEST_WINDOW_BASE) as usize;
        Some(Ref::map(self.mem.borrow(), move |v| &v[off..off + len]))
    }
}

impl Default for GuestMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GuestMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GuestMemory")
            .field("window_base", &format_args!("0x{:08x}", GUEST_WINDOW_BASE))
            .field("window_top", &format_args!("0x{:08x}", GUEST_WINDOW_TOP))
            .finish()
    }
}
