//! The M-cycle descriptor: an immutable record consumed one per M-cycle by
//! the CPU's T-cycle state machine. Grounded on `SM83.hpp`'s `MCycle` /
//! `Decoder` structs.

use crate::alu::AluOp;
use crate::idu::IduOp;
use crate::registers::RegisterOperand;

#[derive(Debug, Clone, Copy)]
pub struct AluCycle {
    pub op: AluOp,
    pub operand_a: RegisterOperand,
    pub operand_b: RegisterOperand,
    pub dest: RegisterOperand,
}

pub fn no_alu() -> AluCycle {
    AluCycle {
        op: AluOp::Nop,
        operand_a: RegisterOperand::None,
        operand_b: RegisterOperand::None,
        dest: RegisterOperand::None,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IduCycle {
    pub op: IduOp,
    pub operand: RegisterOperand,
    pub dest: RegisterOperand,
}

pub fn no_idu() -> IduCycle {
    IduCycle {
        op: IduOp::Nop,
        operand: RegisterOperand::None,
        dest: RegisterOperand::None,
    }
}

bitflags::bitflags! {
    #[derive(Default)]
    pub struct MemFlags: u8 {
        const ACTIVE         = 0x01;
        const IS_WRITE       = 0x02;
        const USE_OFFSET     = 0x04;
    }
}

/// A memory access attached to an M-cycle: active?, read/write?,
/// offset-based (0xFF00 + reg)?, the data register, and the address
/// register (or the pre-offset low byte register when `USE_OFFSET`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MemOp {
    pub flags: MemFlags,
    pub reg: RegisterOperand,
    pub address_src: RegisterOperand,
}

impl MemOp {
    pub fn is_active(&self) -> bool {
        self.flags.contains(MemFlags::ACTIVE)
    }
    pub fn is_write(&self) -> bool {
        self.flags.contains(MemFlags::IS_WRITE)
    }
}

pub fn no_mem() -> MemOp {
    MemOp {
        flags: MemFlags::empty(),
        reg: RegisterOperand::None,
        address_src: RegisterOperand::None,
    }
}

pub fn mem_read(address_src: RegisterOperand, reg: RegisterOperand) -> MemOp {
    MemOp {
        flags: MemFlags::ACTIVE,
        reg,
        address_src,
    }
}

pub fn mem_write(reg: RegisterOperand, address_src: RegisterOperand) -> MemOp {
    MemOp {
        flags: MemFlags::ACTIVE | MemFlags::IS_WRITE,
        reg,
        address_src,
    }
}

pub fn mem_read_offset(address_src_before_offset: RegisterOperand, reg: RegisterOperand) -> MemOp {
    MemOp {
        flags: MemFlags::ACTIVE | MemFlags::USE_OFFSET,
        reg,
        address_src: address_src_before_offset,
    }
}

pub fn mem_write_offset(reg: RegisterOperand, address_src_before_offset: RegisterOperand) -> MemOp {
    MemOp {
        flags: MemFlags::ACTIVE | MemFlags::IS_WRITE | MemFlags::USE_OFFSET,
        reg,
        address_src: address_src_before_offset,
    }
}

bitflags::bitflags! {
    #[derive(Default)]
    pub struct MiscFlags: u16 {
        const WRITE_WZ_TO_WIDE    = 0x0001;
        const STOP                = 0x0002;
        const HALT                = 0x0004;
        const WRITE_VALUE_TO_WIDE = 0x0008;
        const ENABLE_INTERRUPTS   = 0x0010;
        const DISABLE_INTERRUPTS  = 0x0020;
        const ALU_KEEP_FLAGS      = 0x0040;
        const LAST_CYCLE          = 0x0080;
        const COND_Z              = 0x0100;
        const COND_NZ             = 0x0200;
        const COND_C              = 0x0400;
        const COND_NC             = 0x0800;
        const PREFIX_CB           = 0x1000;
        const ALU_CLEAR_ZERO      = 0x2000;
        const WRITE_OPT_VALUE_TO_WIDE = 0x4000;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Misc {
    pub flags: MiscFlags,
    pub operand: RegisterOperand,
    pub opt_value: u16,
}

pub fn no_misc() -> Misc {
    Misc::default()
}

/// One M-cycle: an ALU transform, an IDU transform, an optional memory
/// access, and a bit-set of control flags.
#[derive(Debug, Clone, Copy)]
pub struct MCycle {
    pub alu: AluCycle,
    pub idu: IduCycle,
    pub mem: MemOp,
    pub misc: Misc,
}

pub fn cycle(alu: AluCycle, idu: IduCycle, mem: MemOp) -> MCycle {
    MCycle {
        alu,
        idu,
        mem,
        misc: no_misc(),
    }
}

pub fn cycle_misc(alu: AluCycle, idu: IduCycle, mem: MemOp, misc: Misc) -> MCycle {
    MCycle { alu, idu, mem, misc }
}

pub const MAX_MCYCLES: usize = 8;

/// An opcode's ordered M-cycle sequence, tagged by how many entries are
/// active (`len`).
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub len: u8,
    pub cycles: [MCycle; MAX_MCYCLES],
    pub mnemonic: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TCycleState {
    T1_0,
    T1_1,
    T2_0,
    T2_1,
    T3_0,
    T3_1,
    T4_0,
    T4_1,
}

impl TCycleState {
    pub fn next(self) -> TCycleState {
        use TCycleState::*;
        match self {
            T1_0 => T1_1,
            T1_1 => T2_0,
            T2_0 => T2_1,
            T2_1 => T3_0,
            T3_0 => T3_1,
            T3_1 => T4_0,
            T4_0 => T4_1,
            T4_1 => T1_0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionTable {
    Default,
    PrefixCb,
    Interrupt,
}

bitflags::bitflags! {
    #[derive(Default)]
    pub struct DecoderFlags: u8 {
        const STOPPED        = 0x01;
        const HALTED         = 0x02;
        const SIGN_BIT_HIGH  = 0x04;
    }
}

/// Decoder state: table-dispatch position plus the two ad-hoc latched bits
/// (sign-bit-high for IDU Adjust, stop/halt for the sub-tick gate).
#[derive(Debug, Clone)]
pub struct Decoder {
    pub flags: DecoderFlags,
    pub next_m_cycle_index: u8,
    pub t_cycle_state: TCycleState,
    pub table: InstructionTable,
    pub curr_m_cycle: MCycle,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            flags: DecoderFlags::empty(),
            next_m_cycle_index: 0,
            t_cycle_state: TCycleState::T1_0,
            table: InstructionTable::Default,
            curr_m_cycle: cycle(no_alu(), no_idu(), no_mem()),
        }
    }
}
