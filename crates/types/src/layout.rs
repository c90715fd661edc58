//! Address layout of the hosting machine as seen by the nucleus.
//!
//! The guest window is the only range guest instructions may fetch, load, or
//! store through. The host partition is enumerated here solely so diagnostics
//! can name the region an out-of-window access aimed at; the arbiter rejects
//! by range, never by table.

/// First byte of the guest window.
pub const GUEST_WINDOW_BASE: u32 = 0x0002_0000;

/// Last byte of the guest window (inclusive).
pub const GUEST_WINDOW_TOP: u32 = 0x00FF_FFFF;

/// Size of the guest window in bytes.
pub const GUEST_WINDOW_SIZE: usize = (GUEST_WINDOW_TOP - GUEST_WINDOW_BASE + 1) as usize;

/// First address past the window; the conventional initial stack pointer for
/// a guest whose stack grows down from the top of its window.
pub const GUEST_STACK_TOP: u32 = GUEST_WINDOW_TOP + 1;

/// True if every byte of the `width`-byte span starting at `addr` lies inside
/// the guest window. The span end is computed in 64 bits so an access near
/// the top of the 32-bit space cannot wrap back into the window.
pub const fn span_in_window(addr: u32, width: u32) -> bool {
    if width == 0 {
        return false;
    }
    let end = addr as u64 + width as u64 - 1;
    addr >= GUEST_WINDOW_BASE && end <= GUEST_WINDOW_TOP as u64
}

/// Host-side partition of non-guest addresses. Region boundaries below the
/// window are fixed by the host environment; they are recorded here only so
/// fault reports can say what a stray access would have hit.
const HOST_REGIONS: &[(u32, u32, &str)] = &[
    (0x0000_0000, 0x0000_01ff, "host zero page and stack"),
    (0x0000_0200, 0x0000_cfff, "host-resident program RAM"),
    (0x0000_d000, 0x0000_dfff, "nucleus bootstrap, direct page and stack"),
    (0x0000_e000, 0x0000_efff, "bitmap and sprite staging reserve"),
    (0x0000_f000, 0x0000_ffff, "nucleus code and I/O window"),
    (0x0001_0000, 0x0001_ffff, "host ROM"),
];

/// Name of the host region `addr` falls in, or `None` for addresses inside
/// the guest window.
pub fn host_region_name(addr: u32) -> Option<&'static str> {
    if addr >= GUEST_WINDOW_BASE && addr <= GUEST_WINDOW_TOP {
        return None;
    }
    for &(lo, hi, name) in HOST_REGIONS {
        if addr >= lo && addr <= hi {
            return Some(name);
        }
    }
    Some("unmapped host space")
}
