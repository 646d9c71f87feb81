pub const LDC: u8 = 0x12;
pub const LDC_W: u8 = 0x13;
pub const LDC2_W: u8 = 0x14;
pub const IINC: u8 = 0x84;
pub const TABLESWITCH: u8 = 0xaa;
pub const LOOKUPSWITCH: u8 = 0xab;
pub const GETSTATIC: u8 = 0xb2;
pub const INVOKESTATIC: u8 = 0xb8;
pub const INVOKEINTERFACE: u8 = 0xb9;
pub const INVOKEDYNAMIC: u8 = 0xba;
pub const NEW: u8 = 0xbb;
pub const ANEWARRAY: u8 = 0xbd;
pub const CHECKCAST: u8 = 0xc0;
pub const INSTANCEOF: u8 = 0xc1;
pub const WIDE: u8 = 0xc4;
pub const MULTIANEWARRAY: u8 = 0xc5;
/// Highest opcode defined for class files (`jsr_w`).
pub const LAST_OPCODE: u8 = 0xc9;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperandWidth {
    /// `ldc` takes a one-byte index.
    Byte,
    Short,
}

/// A constant pool index embedded in the bytecode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PoolOperand {
    /// Offset of the opcode in the code array.
    pub pc: usize,
    pub opcode: u8,
    pub width: OperandWidth,
    pub index: u16,
}
