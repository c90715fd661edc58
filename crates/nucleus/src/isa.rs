/// Primary opcodes of the RV32I base integer set.
///
/// The bottom 7 bits of every 32-bit instruction word select one of these;
/// the opcode in turn fixes the instruction format (R, I, S, B, U, J) and
/// which funct fields disambiguate further. Anything not in this table is an
/// illegal encoding.
#[repr(u8)]
#[derive(Debug, PartialEq, Eq)]
pub enum Opcode {
    /// LB, LH, LW, LBU, LHU (I-type).
    Load = 0x03,
    /// FENCE (I-type); ordering is a no-op on a single execution stream.
    MiscMem = 0x0f,
    /// ADDI, SLTI, SLTIU, XORI, ORI, ANDI, SLLI, SRLI, SRAI (I-type).
    OpImm = 0x13,
    /// AUIPC (U-type).
    Auipc = 0x17,
    /// SB, SH, SW (S-type).
    Store = 0x23,
    /// ADD, SUB, SLL, SLT, SLTU, XOR, SRL, SRA, OR, AND (R-type).
    Op = 0x33,
    /// LUI (U-type).
    Lui = 0x37,
    /// BEQ, BNE, BLT, BGE, BLTU, BGEU (B-type).
    Branch = 0x63,
    /// JALR (I-type).
    Jalr = 0x67,
    /// JAL (J-type).
    Jal = 0x6f,
    /// ECALL, EBREAK and the CSR instruction forms.
    System = 0x73,
}

impl Opcode {
    pub fn from_u8(value: u8) -> Option<Self> {
        use Opcode::*;
        Some(match value {
            0x03 => Load,
            0x0f => MiscMem,
            0x13 => OpImm,
            0x17 => Auipc,
            0x23 => Store,
            0x33 => Op,
            0x37 => Lui,
            0x63 => Branch,
            0x67 => Jalr,
            0x6f => Jal,
            0x73 => System,
            _ => return None, // not a base integer opcode
        })
    }
}
