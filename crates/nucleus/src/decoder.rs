use crate::instruction::{CsrOp, Instruction, EBREAK_WORD, ECALL_WORD};
use crate::isa::Opcode;

/// Decode one 32-bit word into an RV32I base operation.
///
/// Pure: never touches processor or memory state. `None` means the word is
/// not a defined base encoding and the run must abort with an
/// illegal-instruction fault. Only fixed-width 32-bit decoding is supported;
/// compressed (16-bit) encodings are rejected outright.
///
/// Field layout of a base instruction word:
/// ```text
/// 31:25  funct7   24:20  rs2   19:15  rs1
/// 14:12  funct3   11:7   rd     6:0   opcode
/// ```
/// Immediates are scattered per format (I, S, B, U, J) and sign-extended
/// from their top bit; the extractors at the bottom of this file reassemble
/// them.
pub fn decode(word: u32) -> Option<Instruction> {
    // Base encodings all have 0b11 in the low two bits; anything else is a
    // compressed-format word, which this nucleus does not implement.
    if word & 0b11 != 0b11 {
        return None;
    }

    let opcode = Opcode::from_u8((word & 0x7f) as u8)?;

    let rd = ((word >> 7) & 0x1f) as usize;
    let funct3 = ((word >> 12) & 0x07) as u8;
    let rs1 = ((word >> 15) & 0x1f) as usize;
    let rs2 = ((word >> 20) & 0x1f) as usize;
    let funct7 = ((word >> 25) & 0x7f) as u8;

    match opcode {
        Opcode::Op => match (funct3, funct7) {
            (0x0, 0x00) => Some(Instruction::Add { rd, rs1, rs2 }),
            (0x0, 0x20) => Some(Instruction::Sub { rd, rs1, rs2 }),
            (0x1, 0x00) => Some(Instruction::Sll { rd, rs1, rs2 }),
            (0x2, 0x00) => Some(Instruction::Slt { rd, rs1, rs2 }),
            (0x3, 0x00) => Some(Instruction::Sltu { rd, rs1, rs2 }),
            (0x4, 0x00) => Some(Instruction::Xor { rd, rs1, rs2 }),
            (0x5, 0x00) => Some(Instruction::Srl { rd, rs1, rs2 }),
            (0x5, 0x20) => Some(Instruction::Sra { rd, rs1, rs2 }),
            (0x6, 0x00) => Some(Instruction::Or { rd, rs1, rs2 }),
            (0x7, 0x00) => Some(Instruction::And { rd, rs1, rs2 }),
            _ => None,
        },

        Opcode::OpImm => {
            // 12-bit immediate in bits 31:20, sign-extended.
            let imm = (word as i32) >> 20;
            match funct3 {
                0x0 => Some(Instruction::Addi { rd, rs1, imm }),
                0x2 => Some(Instruction::Slti { rd, rs1, imm }),
                0x3 => Some(Instruction::Sltiu { rd, rs1, imm }),
                0x4 => Some(Instruction::Xori { rd, rs1, imm }),
                0x6 => Some(Instruction::Ori { rd, rs1, imm }),
                0x7 => Some(Instruction::Andi { rd, rs1, imm }),
                // Shifts reuse funct7 to discriminate; stray upper bits make
                // the encoding undefined.
                0x1 => match funct7 {
                    0x00 => Some(Instruction::Slli {
                        rd,
                        rs1,
                        shamt: rs2 as u8,
                    }),
                    _ => None,
                },
                0x5 => match funct7 {
                    0x00 => Some(Instruction::Srli {
                        rd,
                        rs1,
                        shamt: rs2 as u8,
                    }),
                    0x20 => Some(Instruction::Srai {
                        rd,
                        rs1,
                        shamt: rs2 as u8,
                    }),
                    _ => None,
                },
                _ => None,
            }
        }

        Opcode::Load => {
            let imm = (word as i32) >> 20;
            match funct3 {
                0x0 => Some(Instruction::Lb { rd, rs1, offset: imm }),
                0x1 => Some(Instruction::Lh { rd, rs1, offset: imm }),
                0x2 => Some(Instruction::Lw { rd, rs1, offset: imm }),
                0x4 => Some(Instruction::Lbu { rd, rs1, offset: imm }),
                0x5 => Some(Instruction::Lhu { rd, rs1, offset: imm }),
                _ => None,
            }
        }

        Opcode::Store => {
            // S-type: imm[11:5] in bits 31:25, imm[4:0] in bits 11:7.
            let imm = extract_store_offset(word);
            match funct3 {
                0x0 => Some(Instruction::Sb { rs1, rs2, offset: imm }),
                0x1 => Some(Instruction::Sh { rs1, rs2, offset: imm }),
                0x2 => Some(Instruction::Sw { rs1, rs2, offset: imm }),
                _ => None,
            }
        }

        Opcode::Branch => {
            let imm = extract_branch_offset(word);
            match funct3 {
                0x0 => Some(Instruction::Beq { rs1, rs2, offset: imm }),
                0x1 => Some(Instruction::Bne { rs1, rs2, offset: imm }),
                0x4 => Some(Instruction::Blt { rs1, rs2, offset: imm }),
                0x5 => Some(Instruction::Bge { rs1, rs2, offset: imm }),
                0x6 => Some(Instruction::Bltu { rs1, rs2, offset: imm }),
                0x7 => Some(Instruction::Bgeu { rs1, rs2, offset: imm }),
                _ => None,
            }
        }

        Opcode::Jal => Some(Instruction::Jal {
            rd,
            offset: extract_jal_offset(word),
        }),

        Opcode::Jalr => {
            let imm = (word as i32) >> 20;
            match funct3 {
                0x0 => Some(Instruction::Jalr { rd, rs1, offset: imm }),
                _ => None,
            }
        }

        Opcode::Lui => Some(Instruction::Lui {
            rd,
            imm: ((word >> 12) & 0xfffff) as i32,
        }),

        Opcode::Auipc => Some(Instruction::Auipc {
            rd,
            imm: ((word >> 12) & 0xfffff) as i32,
        }),

        // FENCE's predecessor/successor sets are irrelevant to a single
        // in-order stream; every funct3=0 encoding is accepted as the same
        // no-op. FENCE.I is carried along for compatibility with common
        // toolchain output.
        Opcode::MiscMem => match funct3 {
            0x0 | 0x1 => Some(Instruction::Fence),
            _ => None,
        },

        Opcode::System => match funct3 {
            0x0 => match word {
                ECALL_WORD => Some(Instruction::Ecall),
                EBREAK_WORD => Some(Instruction::Ebreak),
                // MRET, SRET, WFI and friends are privileged-architecture
                // encodings, not base integer ones.
                _ => None,
            },
            // CSR forms: funct3 low two bits pick the op, bit 2 selects the
            // zimm variants. The 12-bit CSR index lives in bits 31:20.
            _ => {
                let op = match funct3 & 0b11 {
                    0b01 => CsrOp::Csrrw,
                    0b10 => CsrOp::Csrrs,
                    0b11 => CsrOp::Csrrc,
                    _ => return None, // funct3 = 0b100 is unassigned
                };
                Some(Instruction::Csr {
                    rd,
                    rs1,
                    csr: ((word >> 20) & 0xfff) as u16,
                    op,
                    imm: funct3 & 0b100 != 0,
                })
            }
        },
    }
}

fn extract_store_offset(word: u32) -> i32 {
    let imm11_5 = ((word >> 25) & 0x7f) << 5;
    let imm4_0 = (word >> 7) & 0x1f;
    ((imm11_5 | imm4_0) as i32) << 20 >> 20 // sign-extend 12-bit
}

fn extract_branch_offset(word: u32) -> i32 {
    let imm12 = ((word >> 31) & 0x1) << 12;
    let imm11 = ((word >> 7) & 0x1) << 11;
    let imm10_5 = ((word >> 25) & 0x3f) << 5;
    let imm4_1 = ((word >> 8) & 0xf) << 1;
    let imm = (imm12 | imm11 | imm10_5 | imm4_1) as i32;
    (imm << 19) >> 19 // sign-extend 13-bit
}

fn extract_jal_offset(word: u32) -> i32 {
    let imm20 = ((word >> 31) & 0x1) << 20;
    let imm19_12 = ((word >> 12) & 0xff) << 12;
    let imm11 = ((word >> 20) & 0x1) << 11;
    let imm10_1 = ((word >> 21) & 0x3ff) << 1;
    let imm = (imm20 | imm19_12 | imm11 | imm10_1) as i32;
    (imm << 11) >> 11 // sign-extend 21-bit
}
