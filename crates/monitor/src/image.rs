use thiserror::Error;
use types::layout::{span_in_window, GUEST_STACK_TOP, GUEST_WINDOW_BASE};

/// A program image plus the startup values the loader hands the nucleus:
/// where the image lands, where execution starts, and the initial
/// stack/argument register (conventionally pointing at the argument buffer
/// the shell assembled).
///
/// The image format itself is opaque here: raw bytes, already flattened by
/// whatever loaded them from storage.
#[derive(Debug, Clone)]
pub struct GuestImage {
    pub load_addr: u32,
    pub entry: u32,
    pub initial_sp: u32,
    pub bytes: Vec<u8>,
}

/// Rejections raised at load time, before any nucleus is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("empty program image")]
    EmptyImage,

    #[error("image span 0x{start:08x}..=0x{end:08x} leaves the guest window")]
    ImageOutsideWindow { start: u32, end: u32 },

    #[error("entry point 0x{0:08x} outside the guest window")]
    EntryOutsideWindow(u32),

    #[error("entry point 0x{0:08x} is not 4-byte aligned")]
    MisalignedEntry(u32),
}

impl GuestImage {
    /// Image loaded and entered at `load_addr`, with the stack at the top of
    /// the window. Callers adjust fields for other conventions.
    pub fn new(load_addr: u32, bytes: Vec<u8>) -> Self {
        Self {
            load_addr,
            entry: load_addr,
            initial_sp: GUEST_STACK_TOP,
            bytes,
        }
    }

    /// Image at the base of the guest window, the usual place the shell
    /// loads a program.
    pub fn at_window_base(bytes: Vec<u8>) -> Self {
        Self::new(GUEST_WINDOW_BASE, bytes)
    }

    pub fn with_entry(mut self, entry: u32) -> Self {
        self.entry = entry;
        self
    }

    pub fn with_initial_sp(mut self, initial_sp: u32) -> Self {
        self.initial_sp = initial_sp;
        self
    }

    /// End address of the image span (inclusive), in 64 bits so oversized
    /// images near the top of the address space cannot wrap.
    fn span_end(&self) -> u64 {
        self.load_addr as u64 + self.bytes.len() as u64 - 1
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        if self.bytes.is_empty() {
            return Err(LoadError::EmptyImage);
        }
        if !span_in_window(self.load_addr, u32::try_from(self.bytes.len()).unwrap_or(u32::MAX))
        {
            return Err(LoadError::ImageOutsideWindow {
                start: self.load_addr,
                end: self.span_end() as u32,
            });
        }
        if !span_in_window(self.entry, 4) {
            return Err(LoadError::EntryOutsideWindow(self.entry));
        }
        if self.entry % 4 != 0 {
            return Err(LoadError::MisalignedEntry(self.entry));
        }
        Ok(())
    }
}
