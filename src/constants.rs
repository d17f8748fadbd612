//! Word-size and address-space constants for the 16-bit architecture.

/// A 16-bit machine word.
pub type Word = u16;

/// Total addressable memory, in words.
pub const MEM_SIZE: usize = 32_768;

/// Highest valid memory address.
pub const MAX_ADDRESS: Word = (MEM_SIZE - 1) as Word;

/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Bit that distinguishes a register reference from a literal value in any
/// 16-bit operand.
pub const REGISTER_TAG: Word = 0x8000;

/// Mask isolating the 15-bit literal value or register index out of an
/// operand word.
pub const VALUE_MASK: Word = 0x7FFF;

/// Modulus for `add`, `mult`, `set`-derived arithmetic.
pub const MODULUS: u32 = MEM_SIZE as u32;
