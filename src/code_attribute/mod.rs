//! Walks raw bytecode to find the constant pool operands of each instruction.
//!
//! Instructions are not decoded into a model: the remapper only ever swaps
//! one pool index for another, so operands are patched in place and every
//! other byte (including switch padding) is preserved.

mod types;

pub use self::types::*;

use crate::error::{RemapError, Result};

fn truncated(pc: usize) -> RemapError {
    RemapError::malformed(None, format!("truncated instruction at code offset {pc}"))
}

fn read_u16(code: &[u8], at: usize, pc: usize) -> Result<u16> {
    match code.get(at..at + 2) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo])),
        _ => Err(truncated(pc)),
    }
}

fn read_i32(code: &[u8], at: usize, pc: usize) -> Result<i32> {
    match code.get(at..at + 4) {
        Some(&[a, b, c, d]) => Ok(i32::from_be_bytes([a, b, c, d])),
        _ => Err(truncated(pc)),
    }
}

/// Length in bytes of the instruction starting at `pc`.
fn instruction_length(code: &[u8], pc: usize) -> Result<usize> {
    let opcode = code[pc];
    let length = match opcode {
        0x00..=0x0f => 1,
        0x10 => 2,
        0x11 => 3,
        LDC => 2,
        LDC_W | LDC2_W => 3,
        0x15..=0x19 => 2,
        0x1a..=0x35 => 1,
        0x36..=0x3a => 2,
        0x3b..=0x83 => 1,
        IINC => 3,
        0x85..=0x98 => 1,
        0x99..=0xa8 => 3,
        0xa9 => 2,
        TABLESWITCH => {
            let base = pc + 1 + (4 - (pc + 1) % 4) % 4;
            let low = read_i32(code, base + 4, pc)?;
            let high = read_i32(code, base + 8, pc)?;
            if high < low {
                return Err(RemapError::malformed(
                    None,
                    format!("tableswitch at code offset {pc} has high < low"),
                ));
            }
            let entries = (i64::from(high) - i64::from(low) + 1) as usize;
            base + 12 + entries * 4 - pc
        }
        LOOKUPSWITCH => {
            let base = pc + 1 + (4 - (pc + 1) % 4) % 4;
            let npairs = read_i32(code, base + 4, pc)?;
            if npairs < 0 {
                return Err(RemapError::malformed(
                    None,
                    format!("lookupswitch at code offset {pc} has a negative pair count"),
                ));
            }
            base + 8 + npairs as usize * 8 - pc
        }
        0xac..=0xb1 => 1,
        GETSTATIC..=INVOKESTATIC => 3,
        INVOKEINTERFACE | INVOKEDYNAMIC => 5,
        NEW => 3,
        0xbc => 2,
        ANEWARRAY => 3,
        0xbe | 0xbf => 1,
        CHECKCAST | INSTANCEOF => 3,
        0xc2 | 0xc3 => 1,
        WIDE => match code.get(pc + 1) {
            Some(&IINC) => 6,
            Some(0x15..=0x19 | 0x36..=0x3a | 0xa9) => 4,
            Some(other) => {
                return Err(RemapError::malformed(
                    None,
                    format!("wide applied to opcode 0x{other:02x} at code offset {pc}"),
                ));
            }
            None => return Err(truncated(pc)),
        },
        MULTIANEWARRAY => 4,
        0xc6 | 0xc7 => 3,
        0xc8 | LAST_OPCODE => 5,
        undefined => {
            return Err(RemapError::malformed(
                None,
                format!("undefined opcode 0x{undefined:02x} at code offset {pc}"),
            ));
        }
    };
    if pc + length > code.len() {
        return Err(truncated(pc));
    }
    Ok(length)
}

/// Every constant pool operand in `code`, in instruction order.
pub fn pool_operands(code: &[u8]) -> Result<Vec<PoolOperand>> {
    let mut operands = Vec::new();
    let mut pc = 0;
    while pc < code.len() {
        let length = instruction_length(code, pc)?;
        let opcode = code[pc];
        let operand = match opcode {
            LDC => Some(PoolOperand {
                pc,
                opcode,
                width: OperandWidth::Byte,
                index: u16::from(code[pc + 1]),
            }),
            LDC_W | LDC2_W | GETSTATIC..=INVOKEDYNAMIC | NEW | ANEWARRAY | CHECKCAST
            | INSTANCEOF | MULTIANEWARRAY => Some(PoolOperand {
                pc,
                opcode,
                width: OperandWidth::Short,
                index: read_u16(code, pc + 1, pc)?,
            }),
            _ => None,
        };
        operands.extend(operand);
        pc += length;
    }
    Ok(operands)
}

/// Checks that `code` is a sequence of well-formed instructions.
pub fn validate(code: &[u8]) -> Result<()> {
    pool_operands(code).map(|_| ())
}

/// Overwrites the pool index of `operand` in `code`.
pub fn patch_operand(code: &mut [u8], operand: &PoolOperand, index: u16) -> Result<()> {
    match operand.width {
        OperandWidth::Byte => {
            let byte = u8::try_from(index).map_err(|_| {
                RemapError::malformed(
                    None,
                    format!("ldc at code offset {} cannot address #{index}", operand.pc),
                )
            })?;
            code[operand.pc + 1] = byte;
        }
        OperandWidth::Short => {
            code[operand.pc + 1..operand.pc + 3].copy_from_slice(&index.to_be_bytes());
        }
    }
    Ok(())
}
