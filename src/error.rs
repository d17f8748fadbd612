use derive_more::{Display, From};

use crate::constants::Word;

pub type Result<T> = core::result::Result<T, VmError>;

/// Program faults: conditions that abort the instruction that raised them
/// but not the VM itself; the debugger catches these per-command and keeps
/// running.
#[derive(Debug, Display, From)]
pub enum VmError {
    #[display("memory access out of bounds: {_0:#06x}")]
    OutOfBounds(Word),

    #[display("invalid register index: {_0}")]
    InvalidRegister(Word),

    #[display("operand is not a register reference: {_0:#06x}")]
    NotARegister(Word),

    #[display("stack underflow")]
    StackUnderflow,

    #[display("unknown opcode: {_0}")]
    UnknownOpcode(Word),

    #[display("division by zero")]
    DivideByZero,

    #[display("cannot open binary file: {_0}")]
    CannotOpen(String),

    #[display("{_0}")]
    BadArgument(String),

    #[from]
    Io(std::io::Error),
}

impl std::error::Error for VmError {}
