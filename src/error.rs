//! The one surfaceable error condition this core raises at runtime: an
//! opcode byte with no table entry (GB calls these "lockup" opcodes because
//! real hardware hangs the bus instead of executing them). Everything else
//! that can go wrong (misaligned MMU mapping, a malformed instruction
//! table entry) is a programmer error and panics via `assert!`, matching
//! the `EMU_ASSERT` convention in the original source.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreError {
    /// No instruction table entry exists for this opcode in this table.
    IllegalOpcode { table: crate::mcycle::InstructionTable, opcode: u8 },
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::IllegalOpcode { table, opcode } => {
                write!(f, "illegal opcode {opcode:#04X} in table {table:?}")
            }
        }
    }
}

impl std::error::Error for CoreError {}

pub type CoreResult<T> = Result<T, CoreError>;
