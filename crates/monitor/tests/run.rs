//! End-to-end runs through the monitor: image validation, the halt
//! convention, fault reporting, and the host-side bridge shims.

use std::cell::Cell;
use std::rc::Rc;

use monitor::image::{GuestImage, LoadError};
use monitor::irq::{IrqLine, StopLine};
use monitor::monitor::Monitor;
use nucleus::nucleus::NucleusConfig;
use once_cell::sync::Lazy;
use types::layout::{GUEST_STACK_TOP, GUEST_WINDOW_BASE};
use types::{AccessKind, Fault, PrivilegeMode, RunOutcome};

const EBREAK: u32 = 0x0010_0073;

// Hand-assembled words; mnemonics alongside.
fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    ((imm as u32 & 0xfff) << 20) | (rs1 << 15) | (rd << 7) | 0x13
}
fn sw(rs1: u32, rs2: u32, offset: i32) -> u32 {
    let imm = offset as u32 & 0xfff;
    ((imm >> 5) << 25) | (rs2 << 20) | (rs1 << 15) | (0x2 << 12) | ((imm & 0x1f) << 7) | 0x23
}
fn csrrwi(rd: u32, csr: u32, uimm: u32) -> u32 {
    ((csr & 0xfff) << 20) | ((uimm & 0x1f) << 15) | (0x5 << 12) | (rd << 7) | 0x73
}
fn csrrs(rd: u32, csr: u32, rs1: u32) -> u32 {
    ((csr & 0xfff) << 20) | (rs1 << 15) | (0x2 << 12) | (rd << 7) | 0x73
}

fn to_bytes(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}

#[derive(Debug)]
struct TestCase {
    name: &'static str,
    program: Vec<u32>,
    expected: RunOutcome,
}

static TEST_CASES: Lazy<Vec<TestCase>> = Lazy::new(|| {
    vec![
        TestCase {
            name: "halt sequence at entry",
            program: vec![EBREAK],
            expected: RunOutcome::Halted { status: 0 },
        },
        TestCase {
            name: "status handed back through a0",
            program: vec![addi(10, 0, 7), EBREAK],
            expected: RunOutcome::Halted { status: 7 },
        },
        TestCase {
            name: "store below the window",
            program: vec![sw(0, 0, 0x400), EBREAK],
            expected: RunOutcome::Aborted {
                fault: Fault::OutOfRangeAccess {
                    kind: AccessKind::Store,
                    addr: 0x0000_0400,
                    width: 4,
                },
                pc: GUEST_WINDOW_BASE,
            },
        },
        TestCase {
            name: "undefined opcode",
            program: vec![0x0000_007f],
            expected: RunOutcome::Aborted {
                fault: Fault::IllegalInstruction { opcode: 0x0000_007f },
                pc: GUEST_WINDOW_BASE,
            },
        },
        TestCase {
            name: "csr probe in user mode",
            program: vec![csrrwi(0, 0x340, 7), csrrs(10, 0x340, 0), EBREAK],
            // a0 holds the CSR readback: zero, the write vanished.
            expected: RunOutcome::Halted { status: 0 },
        },
    ]
});

#[test]
fn guest_program_table() {
    for case in TEST_CASES.iter() {
        let mut monitor = Monitor::new();
        let image = GuestImage::at_window_base(to_bytes(&case.program));
        let outcome = monitor.run_guest(&image).expect(case.name);
        assert_eq!(outcome, case.expected, "case `{}`", case.name);
    }
}

#[test]
fn halt_at_entry_leaves_registers_untouched() {
    let mut monitor = Monitor::new();
    let image = GuestImage::at_window_base(to_bytes(&[EBREAK]));
    let outcome = monitor.run_guest(&image).unwrap();
    assert_eq!(outcome, RunOutcome::Halted { status: 0 });

    let cpu = monitor.last_cpu().unwrap();
    for (i, &reg) in cpu.regs.iter().enumerate() {
        let expected = if i == 2 { GUEST_STACK_TOP } else { 0 };
        assert_eq!(reg, expected, "x{}", i);
    }
    assert_eq!(cpu.pc, GUEST_WINDOW_BASE);
}

#[test]
fn load_rejections() {
    let mut monitor = Monitor::new();

    assert_eq!(
        monitor.run_guest(&GuestImage::at_window_base(vec![])),
        Err(LoadError::EmptyImage)
    );
    assert_eq!(
        monitor.run_guest(&GuestImage::new(0x0000_1000, vec![0; 16])),
        Err(LoadError::ImageOutsideWindow {
            start: 0x0000_1000,
            end: 0x0000_100f,
        })
    );
    assert_eq!(
        monitor.run_guest(
            &GuestImage::at_window_base(to_bytes(&[EBREAK])).with_entry(0x0100_0000)
        ),
        Err(LoadError::EntryOutsideWindow(0x0100_0000))
    );
    assert_eq!(
        monitor.run_guest(
            &GuestImage::at_window_base(to_bytes(&[EBREAK])).with_entry(GUEST_WINDOW_BASE + 2)
        ),
        Err(LoadError::MisalignedEntry(GUEST_WINDOW_BASE + 2))
    );
}

#[test]
fn custom_halt_word_moves_the_convention() {
    // With the halt convention moved elsewhere, a bare EBREAK is no longer a
    // halt and aborts instead.
    let halt_word = 0x0000_00ff; // not a valid encoding; fine for a sentinel
    let config = NucleusConfig {
        halt_word,
        mode: PrivilegeMode::User,
    };

    let mut monitor = Monitor::with_config(config);
    let image = GuestImage::at_window_base(to_bytes(&[addi(10, 0, 9), halt_word]));
    assert_eq!(
        monitor.run_guest(&image).unwrap(),
        RunOutcome::Halted { status: 9 }
    );

    let mut monitor = Monitor::with_config(config);
    let image = GuestImage::at_window_base(to_bytes(&[EBREAK]));
    assert_eq!(
        monitor.run_guest(&image).unwrap(),
        RunOutcome::Aborted {
            fault: Fault::IllegalInstruction { opcode: EBREAK },
            pc: GUEST_WINDOW_BASE,
        }
    );
}

#[test]
fn describe_names_the_host_region() {
    let mut monitor = Monitor::new();
    let image = GuestImage::at_window_base(to_bytes(&[sw(0, 0, 0x400)]));
    let outcome = monitor.run_guest(&image).unwrap();

    let diag = monitor.describe(&outcome);
    assert!(diag.contains("0x00000400"), "diagnostic was: {}", diag);
    assert!(
        diag.contains("host-resident program RAM"),
        "diagnostic was: {}",
        diag
    );
}

#[test]
fn describe_halted_run() {
    let mut monitor = Monitor::new();
    let image = GuestImage::at_window_base(to_bytes(&[addi(10, 0, 3), EBREAK]));
    let outcome = monitor.run_guest(&image).unwrap();
    assert_eq!(monitor.describe(&outcome), "guest halted with status 3");
}

#[test]
fn register_dump_uses_abi_names() {
    let mut monitor = Monitor::new();
    let image = GuestImage::at_window_base(to_bytes(&[addi(10, 0, 3), EBREAK]));
    monitor.run_guest(&image).unwrap();

    let dump = monitor.dump_registers();
    assert!(dump.contains("(a0  )"), "dump was: {}", dump);
    assert!(dump.contains("(sp  )"), "dump was: {}", dump);
    assert!(dump.contains("pc"), "dump was: {}", dump);
}

#[test]
fn memory_dump_is_window_checked() {
    let mut monitor = Monitor::new();
    let image = GuestImage::at_window_base(to_bytes(&[EBREAK]));
    monitor.run_guest(&image).unwrap();

    let dump = monitor.dump_memory(GUEST_WINDOW_BASE, 16).unwrap();
    assert!(dump.contains("73 00 10 00"), "dump was: {}", dump);

    assert!(monitor.dump_memory(0x0000_0000, 16).is_none());
}

#[test]
fn irq_line_services_host_interrupts_transparently() {
    let ticks = Rc::new(Cell::new(0u32));
    let handler_ticks = Rc::clone(&ticks);
    let (line, trigger) = IrqLine::new(Box::new(move || {
        handler_ticks.set(handler_ticks.get() + 1);
    }));

    // Two interrupts latched before the run even starts; both must be
    // delegated at the first boundary.
    trigger.raise();
    trigger.raise();

    let mut monitor = Monitor::new();
    let image = GuestImage::at_window_base(to_bytes(&[addi(10, 0, 5), EBREAK]));
    let outcome = monitor
        .run_guest_with(
            &image,
            Box::new(line),
            Box::new(nucleus::service::UnimplementedServices),
        )
        .unwrap();

    assert_eq!(outcome, RunOutcome::Halted { status: 5 });
    assert_eq!(ticks.get(), 2);
    assert_eq!(trigger.pending(), 0);
}

#[test]
fn stop_line_cancels_a_run() {
    let stop = StopLine::default();
    stop.request(Fault::IllegalInstruction { opcode: 0 });

    let mut monitor = Monitor::new();
    // An endless loop; only the stop line can end it.
    let image = GuestImage::at_window_base(to_bytes(&[
        0x0000_006f, // jal x0, 0 (spin in place)
    ]));
    let outcome = monitor
        .run_guest_with(
            &image,
            Box::new(stop.clone()),
            Box::new(nucleus::service::UnimplementedServices),
        )
        .unwrap();

    assert_eq!(
        outcome,
        RunOutcome::Aborted {
            fault: Fault::IllegalInstruction { opcode: 0 },
            pc: GUEST_WINDOW_BASE,
        }
    );
}

#[test]
fn ecall_reaches_the_reserved_surface_and_is_refused() {
    let mut monitor = Monitor::new();
    let image = GuestImage::at_window_base(to_bytes(&[0x0000_0073 /* ecall */]));
    let outcome = monitor.run_guest(&image).unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Aborted {
            fault: Fault::IllegalInstruction { opcode: 0x0000_0073 },
            pc: GUEST_WINDOW_BASE,
        }
    );
}
