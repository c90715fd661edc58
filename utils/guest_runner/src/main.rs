use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::fs;
use std::path::PathBuf;

use monitor::image::GuestImage;
use monitor::monitor::Monitor;
use nucleus::nucleus::NucleusConfig;
use types::layout::{GUEST_STACK_TOP, GUEST_WINDOW_BASE};
use types::{PrivilegeMode, RunOutcome};

mod logger;

/// Run a raw RV32I guest image under the confinement nucleus and report the
/// outcome
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Raw guest program image (flat binary)
    image: PathBuf,

    /// Address the image is loaded at
    #[arg(long, default_value = "0x00020000", value_parser = parse_addr)]
    load_addr: u32,

    /// Entry program counter (defaults to the load address)
    #[arg(long, value_parser = parse_addr)]
    entry: Option<u32>,

    /// Initial stack/argument register value
    #[arg(long, value_parser = parse_addr)]
    sp: Option<u32>,

    /// Word recognized as the guest halt request
    #[arg(long, default_value = "0x00100073", value_parser = parse_addr)]
    halt_word: u32,

    /// Run the guest in supervisor mode instead of user mode
    #[arg(long)]
    supervisor: bool,

    /// Print every executed instruction
    #[arg(short, long)]
    trace: bool,

    /// Dump the guest registers after the run
    #[arg(short, long)]
    dump_regs: bool,
}

fn parse_addr(s: &str) -> std::result::Result<u32, String> {
    let parsed = if let Some(hex_part) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex_part, 16)
    } else {
        s.parse::<u32>()
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", s, e))
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let args = Args::parse();
    logger::init(args.trace);

    println!("{}", "Guest Runner".bold().blue());
    println!("{}", "============".blue());

    let bytes = fs::read(&args.image)
        .with_context(|| format!("failed to read image {:?}", args.image))?;
    println!(
        "{} {} ({} bytes at 0x{:08x})",
        "Image:".bold(),
        args.image.display(),
        bytes.len(),
        args.load_addr
    );

    let image = GuestImage::new(args.load_addr, bytes)
        .with_entry(args.entry.unwrap_or(args.load_addr))
        .with_initial_sp(args.sp.unwrap_or(GUEST_STACK_TOP));

    let config = NucleusConfig {
        halt_word: args.halt_word,
        mode: if args.supervisor {
            PrivilegeMode::Supervisor
        } else {
            PrivilegeMode::User
        },
    };

    let mut monitor = Monitor::with_config(config);
    let outcome = monitor
        .run_guest(&image)
        .context("image rejected at load time")?;

    println!();
    match outcome {
        RunOutcome::Halted { .. } => {
            println!("{} {}", "OK".bold().green(), monitor.describe(&outcome));
        }
        RunOutcome::Aborted { fault, pc } => {
            println!("{} {}", "FAULT".bold().red(), monitor.describe(&outcome));
            if let types::Fault::IllegalInstruction { opcode } = fault {
                // As stored in memory, for eyeballing against hex dumps.
                println!("  word bytes (le): {}", hex::encode(opcode.to_le_bytes()));
            }
            // A short window of code around the fault helps decode mishaps.
            if let Some(dump) = monitor.dump_memory(pc.saturating_sub(16).max(GUEST_WINDOW_BASE), 48)
            {
                println!();
                println!("{}", "Memory near fault:".bold());
                print!("{}", dump);
            }
        }
    }

    if args.dump_regs {
        println!();
        println!("{}", "Registers:".bold());
        print!("{}", monitor.dump_registers());
    }

    Ok(match outcome {
        RunOutcome::Halted { status } => (status & 0xff) as i32,
        RunOutcome::Aborted { .. } => 101,
    })
}
