//! The Sharp SM83 CPU core: a register file, a decoder position within the
//! instruction-table cycle lists, and the per-M-cycle executor that applies
//! one [`MCycle`]'s ALU/IDU/memory/control effects. Grounded on
//! `SM83.hpp`/`SM83.cpp` (the original's T-cycle-granular decoder loop) and
//! this crate's own `mod.rs` (register initialization values, interrupt
//! priority order, the `log::error!` diagnostic convention).

mod timer;

pub use timer::Timer;

use crate::alu::{self, AluOp};
use crate::error::{CoreError, CoreResult};
use crate::idu::{self, IduOp, IduOpFlags};
use crate::instruction_table::{get_instruction, get_opcode_name};
use crate::mcycle::{AluCycle, IduCycle, InstructionTable, MemFlags, MemOp, Misc, MiscFlags};
use crate::mmu::Mmu;
use crate::peripheral_io::PeripheralIo;
use crate::registers::{RegisterOperand, Registers, FLAG_C, FLAG_Z, WIDE_START};

/// `(interrupt bit, vector address)` in dispatch priority order: VBlank,
/// LCD STAT, Timer, Serial, Joypad.
const INTERRUPT_PRIORITY: [(u8, u16); 5] = [(0, 0x0040), (1, 0x0048), (2, 0x0050), (3, 0x0058), (4, 0x0060)];

/// Cycle-accurate SM83 core. Each call to [`Cpu::step`] advances exactly one
/// M-cycle: it runs the ALU/IDU/memory/control effects of a single
/// [`crate::mcycle::MCycle`] and ticks the system timer the 4 T-cycles that
/// M-cycle spans.
#[derive(Debug, Clone)]
pub struct Cpu {
    pub registers: Registers,
    pub timer: Timer,
    ime: bool,
    halted: bool,
    boot_rom_active: bool,
    /// `false` until the very first opcode byte has been fetched into `Ir`;
    /// primes the pipeline the same way a post-interrupt or post-JP(HL)
    /// "fetch with no folded next-fetch" cycle does.
    primed: bool,
    current_table: InstructionTable,
    pending_table: InstructionTable,
    current_opcode: u8,
    next_index: u8,
    sign_bit_high: bool,
    /// Carry-out of the most recent `Add`/`AddKeepZ` ALU cycle, latched
    /// separately from the visible F register so JR's flag-preserving add
    /// can still feed `IduOp::Adjust`'s high-byte correction.
    pending_adjust_carry: bool,
    interrupt_vector: u16,
    pub total_m_cycles: u64,
}

impl Cpu {
    /// Boot-ROM entry state: all registers zeroed, PC at `0x0000`.
    pub fn new() -> Self {
        Cpu {
            registers: Registers::new(),
            timer: Timer::new(),
            ime: false,
            halted: false,
            boot_rom_active: true,
            primed: false,
            current_table: InstructionTable::Default,
            pending_table: InstructionTable::Default,
            current_opcode: 0,
            next_index: 0,
            sign_bit_high: false,
            pending_adjust_carry: false,
            interrupt_vector: 0,
            total_m_cycles: 0,
        }
    }

    /// Skips the boot ROM: canonical post-boot register values (Pandocs
    /// "Power Up Sequence"), as if the boot sequence already ran.
    pub fn new_post_boot() -> Self {
        let mut cpu = Cpu::new();
        cpu.boot_rom_active = false;
        let r = &mut cpu.registers;
        r.store16(RegisterOperand::Af, 0x01B0);
        r.store16(RegisterOperand::Bc, 0x0013);
        r.store16(RegisterOperand::De, 0x00D8);
        r.store16(RegisterOperand::Hl, 0x014D);
        r.store16(RegisterOperand::Sp, 0xFFFE);
        r.store16(RegisterOperand::Pc, 0x0100);
        cpu
    }

    pub fn ime(&self) -> bool {
        self.ime
    }
    pub fn halted(&self) -> bool {
        self.halted
    }
    pub fn pc(&self) -> u16 {
        self.registers.load16(RegisterOperand::Pc)
    }

    fn is_wide(&self, reg: RegisterOperand) -> bool {
        (reg as u8) >= WIDE_START
    }

    /// Advances exactly one M-cycle. Ticks the timer for the 4 T-cycles it
    /// spans regardless of what the CPU itself does that cycle (halted,
    /// mid-instruction, or freshly dispatching).
    pub fn step(&mut self, mmu: &mut Mmu, io: &mut PeripheralIo) -> CoreResult<()> {
        if self.boot_rom_active && io.boot_rom_disabled(io.boot_ctrl()) {
            mmu.remove_zero_redirect();
            self.boot_rom_active = false;
        }

        if self.halted {
            let pending = io.ie_flags().bits() & io.if_flags().bits() & 0x1F;
            if pending != 0 {
                self.halted = false;
            } else {
                self.finish_cycle(io);
                return Ok(());
            }
        }

        if !self.primed {
            self.run_fetch_only(mmu);
            self.primed = true;
            self.finish_cycle(io);
            return Ok(());
        }

        if self.next_index == 0 {
            let pending = io.ie_flags().bits() & io.if_flags().bits() & 0x1F;
            if self.ime && pending != 0 {
                self.begin_interrupt(io, pending);
            } else {
                self.current_table = self.pending_table;
                self.pending_table = InstructionTable::Default;
                self.current_opcode = self.registers.load8(RegisterOperand::Ir);
                if get_opcode_name(self.current_table, self.current_opcode) == "ILLEGAL" {
                    return Err(CoreError::IllegalOpcode { table: self.current_table, opcode: self.current_opcode });
                }
            }
        }

        let instruction = get_instruction(self.current_table, self.current_opcode);
        let mut index = self.next_index;
        let mut mcycle = instruction.cycles[index as usize];

        if self.cond_fails(mcycle.misc.flags) {
            index = instruction.len - 1;
            mcycle = instruction.cycles[index as usize];
        }

        self.run_mem(mmu, mcycle.mem);
        self.run_alu(mcycle.alu, mcycle.misc.flags.contains(MiscFlags::ALU_CLEAR_ZERO));
        self.run_idu(mcycle.idu);
        self.run_misc(mcycle.misc);

        index += 1;
        self.next_index = if index >= instruction.len { 0 } else { index };

        self.finish_cycle(io);
        Ok(())
    }

    fn finish_cycle(&mut self, io: &mut PeripheralIo) {
        for _ in 0..4 {
            self.timer.tick_t_cycle(io);
        }
        self.total_m_cycles += 1;
    }

    fn run_fetch_only(&mut self, mmu: &mut Mmu) {
        let pc = self.registers.load16(RegisterOperand::Pc);
        let byte = mmu.read(pc);
        self.registers.store8(RegisterOperand::Ir, byte);
        self.registers.store16(RegisterOperand::Pc, pc.wrapping_add(1));
    }

    fn begin_interrupt(&mut self, io: &mut PeripheralIo, pending: u8) {
        let (bit, vector) = INTERRUPT_PRIORITY.iter().find(|&&(bit, _)| pending & (1 << bit) != 0).copied().expect("pending != 0 guarantees a match");
        io.set_if_flags(io.if_flags() & !crate::peripheral_io::InterruptFlags::from_bits_truncate(1 << bit));
        self.interrupt_vector = vector;
        self.ime = false;
        self.current_table = InstructionTable::Interrupt;
        self.current_opcode = 0;
    }

    fn cond_fails(&self, flags: MiscFlags) -> bool {
        let f = self.registers.load8(RegisterOperand::F);
        if flags.contains(MiscFlags::COND_Z) {
            return f & FLAG_Z == 0;
        }
        if flags.contains(MiscFlags::COND_NZ) {
            return f & FLAG_Z != 0;
        }
        if flags.contains(MiscFlags::COND_C) {
            return f & FLAG_C == 0;
        }
        if flags.contains(MiscFlags::COND_NC) {
            return f & FLAG_C != 0;
        }
        false
    }

    fn run_mem(&mut self, mmu: &mut Mmu, mem: MemOp) {
        if !mem.is_active() {
            return;
        }
        let address = if mem.flags.contains(MemFlags::USE_OFFSET) {
            0xFF00u16 | self.registers.load8(mem.address_src) as u16
        } else {
            self.registers.load16(mem.address_src)
        };
        if mem.is_write() {
            let value = self.registers.load8(mem.reg);
            mmu.write(address, value);
        } else {
            let value = mmu.read(address);
            self.registers.store8(mem.reg, value);
            if matches!(mem.reg, RegisterOperand::Z) {
                self.sign_bit_high = value & 0x80 != 0;
            }
        }
    }

    fn run_alu(&mut self, alu_cycle: AluCycle, clear_zero: bool) {
        if matches!(alu_cycle.op, AluOp::Nop) && matches!(alu_cycle.dest, RegisterOperand::None) {
            return;
        }
        let flags_in = self.registers.load8(RegisterOperand::F);
        let a = if matches!(alu_cycle.operand_a, RegisterOperand::None) { 0 } else { self.registers.load8(alu_cycle.operand_a) };
        let b = if matches!(alu_cycle.operand_b, RegisterOperand::None) { 0 } else { self.registers.load8(alu_cycle.operand_b) };
        let out = alu::process(alu_cycle.op, flags_in, a, b);
        if !matches!(alu_cycle.dest, RegisterOperand::None) {
            self.registers.store8(alu_cycle.dest, out.result);
        }
        if matches!(alu_cycle.op, AluOp::Add | AluOp::AddKeepZ) {
            self.pending_adjust_carry = (a as u16 + b as u16) > 0xFF;
        }
        let mut f = out.flags;
        if clear_zero {
            f &= !FLAG_Z;
        }
        self.registers.store8(RegisterOperand::F, f);
    }

    fn run_idu(&mut self, idu_cycle: IduCycle) {
        if matches!(idu_cycle.op, IduOp::Nop) && matches!(idu_cycle.dest, RegisterOperand::None) {
            return;
        }
        let flags = IduOpFlags { sign_bit_high: self.sign_bit_high, alu_has_carry: self.pending_adjust_carry };
        if self.is_wide(idu_cycle.operand) {
            let operand = self.registers.load16(idu_cycle.operand);
            let result = idu::process(idu_cycle.op, operand, flags);
            self.registers.store16(idu_cycle.dest, result);
        } else {
            let operand = self.registers.load8(idu_cycle.operand) as u16;
            let result = idu::process(idu_cycle.op, operand, flags);
            self.registers.store8(idu_cycle.dest, result as u8);
        }
    }

    fn run_misc(&mut self, misc: Misc) {
        if misc.flags.contains(MiscFlags::WRITE_WZ_TO_WIDE) {
            let wz = self.registers.load16(RegisterOperand::Wz);
            self.registers.store16(misc.operand, wz);
        }
        if misc.flags.contains(MiscFlags::WRITE_VALUE_TO_WIDE) {
            let hl = self.registers.load16(RegisterOperand::Hl);
            self.registers.store16(misc.operand, hl);
        }
        if misc.flags.contains(MiscFlags::WRITE_OPT_VALUE_TO_WIDE) {
            let value = if self.current_table == InstructionTable::Interrupt { self.interrupt_vector } else { misc.opt_value };
            self.registers.store16(misc.operand, value);
        }
        if misc.flags.contains(MiscFlags::HALT) {
            self.halted = true;
        }
        if misc.flags.contains(MiscFlags::STOP) {
            // STOP's LCD/input-wake semantics live in the host driver; the
            // core only needs to stop executing until woken.
            self.halted = true;
        }
        if misc.flags.contains(MiscFlags::DISABLE_INTERRUPTS) {
            self.ime = false;
        }
        if misc.flags.contains(MiscFlags::ENABLE_INTERRUPTS) {
            self.ime = true;
        }
        if misc.flags.contains(MiscFlags::PREFIX_CB) {
            self.pending_table = InstructionTable::PrefixCb;
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Cpu::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmu::SegmentFlags;

    struct TestSystem {
        cpu: Cpu,
        mmu: Mmu,
        io: PeripheralIo,
        _rom: Box<[u8; 256]>,
        _ram: Box<[u8; 256]>,
    }

    impl TestSystem {
        fn new(program: &[u8]) -> Self {
            let mut rom = Box::new([0u8; 256]);
            rom[..program.len()].copy_from_slice(program);
            let mut ram = Box::new([0u8; 256]);
            let mut mmu = Mmu::new();
            let mut io = PeripheralIo::new();
            unsafe {
                mmu.map(0x0000, 256, rom.as_mut_ptr(), SegmentFlags::READ_ONLY);
                mmu.map(0xC000, 256, ram.as_mut_ptr(), SegmentFlags::empty());
                mmu.map(0xFF00, 256, io.as_mut_ptr(), SegmentFlags::empty());
            }
            let mut cpu = Cpu::new_post_boot();
            cpu.registers.store16(RegisterOperand::Pc, 0x0000);
            cpu.registers.store16(RegisterOperand::Sp, 0x00C0);
            TestSystem { cpu, mmu, io, _rom: rom, _ram: ram }
        }

        fn run(&mut self, m_cycles: usize) {
            for _ in 0..m_cycles {
                self.cpu.step(&mut self.mmu, &mut self.io).unwrap();
            }
        }
    }

    #[test]
    fn nop_then_ld_a_n_loads_register_and_advances_pc() {
        let mut sys = TestSystem::new(&[0x00, 0x3E, 0x42]); // NOP; LD A,0x42
        sys.run(1 + 1 + 2); // bootstrap fetch + NOP + LD A,n
        assert_eq!(sys.cpu.registers.load8(RegisterOperand::A), 0x42);
        // PC always reads one past the opcode byte already latched into Ir
        // by the previous instruction's trailing fetch cycle.
        assert_eq!(sys.cpu.pc(), 4);
    }

    #[test]
    fn jp_immediate_redirects_pc() {
        // JP 0x0010
        let mut sys = TestSystem::new(&[0xC3, 0x10, 0x00]);
        sys.run(1 + 4); // bootstrap fetch + JP nn
        assert_eq!(sys.cpu.pc(), 0x0011); // JP's trailing fetch already advanced past the target byte
    }

    #[test]
    fn halted_cpu_wakes_on_pending_interrupt() {
        let mut sys = TestSystem::new(&[0x76]); // HALT
        sys.run(1 + 1); // bootstrap fetch + HALT dispatch
        assert!(sys.cpu.halted());
        sys.io.set_raw(crate::peripheral_io::IE, 0x04); // enable the timer interrupt
        sys.io.set_if_flags(crate::peripheral_io::InterruptFlags::TIMER);
        sys.run(1);
        assert!(!sys.cpu.halted());
    }

    #[test]
    fn ei_takes_effect_in_time_for_the_next_m_cycle_boundary() {
        // EI; NOP -- with IE/IF already pending, the VBlank vector must be
        // dispatched at the very next M-cycle boundary after EI's own cycle.
        let mut sys = TestSystem::new(&[0xFB, 0x00]);
        sys.io.set_raw(crate::peripheral_io::IE, 0x01); // enable the vblank interrupt
        sys.io.set_if_flags(crate::peripheral_io::InterruptFlags::VBLANK);
        sys.run(1); // bootstrap fetch
        sys.run(1); // EI
        assert!(sys.cpu.ime());
        sys.run(1); // the fetch that would have loaded NOP instead dispatches
        assert_eq!(sys.cpu.pc(), 0x0040);
    }
}
