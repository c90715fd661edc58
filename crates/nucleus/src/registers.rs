/// Register indices the nucleus itself refers to by name. The guest is free
/// to use all 32 per the standard calling convention.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Register {
    Zero = 0, // x0: hardwired zero
    Ra = 1,   // x1: return address
    Sp = 2,   // x2: stack pointer

    A0 = 10, // x10: argument 0 / return value
    A1 = 11, // x11: argument 1
    A2 = 12, // x12: argument 2
    A3 = 13, // x13: argument 3
    A4 = 14, // x14: argument 4
    A5 = 15, // x15: argument 5
    A7 = 17, // x17: service selector on ECALL
}

pub const ABI_NAMES: [&str; 32] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// ABI name of a register index, for traces and dumps.
pub fn abi_name(index: usize) -> &'static str {
    ABI_NAMES[index & 0x1f]
}
