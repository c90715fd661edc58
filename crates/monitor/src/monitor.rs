use std::fmt::Write as _;

use log::{debug, info};
use nucleus::bridge::{HostBridge, NoopBridge};
use nucleus::cpu::GuestCpu;
use nucleus::nucleus::{Nucleus, NucleusConfig};
use nucleus::registers::ABI_NAMES;
use nucleus::service::{ServiceHandler, UnimplementedServices};
use nucleus::window::GuestMemory;
use types::layout::host_region_name;
use types::{Fault, RunOutcome};

use crate::image::{GuestImage, LoadError};

/// Host-side owner of the guest region and the entry point for one guest
/// run. This is the surface the command shell drives: validate and load an
/// image, run it, and get back the execution result plus printable
/// diagnostics. Register and memory state are preserved after a halt or
/// fault so the shell can report post-mortem detail.
#[derive(Debug)]
pub struct Monitor {
    memory: GuestMemory,
    config: NucleusConfig,
    last_cpu: Option<GuestCpu>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::with_config(NucleusConfig::default())
    }

    pub fn with_config(config: NucleusConfig) -> Self {
        Self {
            memory: GuestMemory::new(),
            config,
            last_cpu: None,
        }
    }

    /// Load `image` into the window and run it with no interrupt sources and
    /// no service surface.
    pub fn run_guest(&mut self, image: &GuestImage) -> Result<RunOutcome, LoadError> {
        self.run_guest_with(
            image,
            Box::new(NoopBridge),
            Box::new(UnimplementedServices),
        )
    }

    /// Load `image` and run it with the given delegation bridge and service
    /// surface.
    pub fn run_guest_with(
        &mut self,
        image: &GuestImage,
        bridge: Box<dyn HostBridge>,
        services: Box<dyn ServiceHandler>,
    ) -> Result<RunOutcome, LoadError> {
        image.validate()?;
        if !self.memory.write_bytes(image.load_addr, &image.bytes) {
            let end = image.load_addr as u64 + image.bytes.len() as u64 - 1;
            return Err(LoadError::ImageOutsideWindow {
                start: image.load_addr,
                end: end as u32,
            });
        }
        info!(
            "loaded {} byte image at 0x{:08x}, entry 0x{:08x}, sp 0x{:08x}",
            image.bytes.len(),
            image.load_addr,
            image.entry,
            image.initial_sp
        );
        debug!("image bytes: 0x{}", hex::encode(&image.bytes));

        let mut nucleus =
            Nucleus::new(self.memory.clone(), image.entry, image.initial_sp, self.config)
                .with_bridge(bridge)
                .with_services(services);
        let outcome = nucleus.run();
        debug!("run finished: {:?}", outcome);

        // Keep the final CPU record around for post-mortem dumps.
        self.last_cpu = Some(nucleus.cpu);
        Ok(outcome)
    }

    /// The guest CPU record as it stood when the last run ended.
    pub fn last_cpu(&self) -> Option<&GuestCpu> {
        self.last_cpu.as_ref()
    }

    pub fn memory(&self) -> &GuestMemory {
        &self.memory
    }

    /// Render the execution result the way the shell prints it. Out-of-range
    /// addresses are annotated with the host region they would have hit.
    pub fn describe(&self, outcome: &RunOutcome) -> String {
        match outcome {
            RunOutcome::Halted { status } => format!("guest halted with status {}", status),
            RunOutcome::Aborted { fault, pc } => {
                let mut out = format!("guest aborted at pc=0x{:08x}: {}", pc, fault);
                if let Fault::OutOfRangeAccess { addr, .. } = fault {
                    if let Some(region) = host_region_name(*addr) {
                        let _ = write!(out, " ({})", region);
                    }
                }
                out
            }
        }
    }

    /// Register dump with ABI names, one per line, for the shell's
    /// diagnostic output.
    pub fn dump_registers(&self) -> String {
        let mut out = String::new();
        if let Some(cpu) = &self.last_cpu {
            for i in 0..32 {
                let _ = writeln!(
                    out,
                    "x{:02} ({:<4}) = 0x{:08x} ({})",
                    i, ABI_NAMES[i], cpu.regs[i], cpu.regs[i]
                );
            }
            let _ = writeln!(out, "pc           = 0x{:08x}", cpu.pc);
        }
        out
    }

    /// Hex dump of `len` bytes of guest memory starting at `start`, 16 per
    /// line with an ASCII gutter. `None` if the span leaves the window.
    pub fn dump_memory(&self, start: u32, len: usize) -> Option<String> {
        let view = self.memory.view(start, len)?;
        let mut out = String::new();
        for (i, line) in view.chunks(16).enumerate() {
            let hex_str = line
                .iter()
                .map(|b| format!("{:02x}", b))
                .collect::<Vec<_>>()
                .join(" ");
            let ascii: String = line
                .iter()
                .map(|&b| if b.is_ascii_graphic() { b as char } else { '.' })
                .collect();
            let _ = writeln!(
                out,
                "{:08x}  {:<47}  |{}|",
                start as usize + i * 16,
                hex_str,
                ascii
            );
        }
        Some(out)
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}
