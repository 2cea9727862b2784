//! Builds the three instruction tables (default, CB-prefixed, interrupt
//! dispatch) once at startup and exposes lookup by opcode. Grounded on
//! `OpCodes.cpp`'s per-quadrant population functions, adapted from
//! hand-written per-opcode C++ calls into small Rust builder loops over the
//! regular parts of the opcode space.
//!
//! Every instruction's cycle list ends with a dedicated fetch cycle
//! (`mem_read(Pc, Ir)` plus `IduOp::Inc` on `Pc`), folded into the
//! instruction's only cycle when it has no memory work of its own (plain
//! register moves, ALU A,r, CB register ops, ...). A conditional cycle
//! that evaluates false aborts straight to this trailing fetch, which is
//! what gives `JR`/`JP cc`/`CALL cc`/`RET cc` their shorter untaken timing.

use crate::alu::AluOp;
use crate::idu::IduOp;
use crate::mcycle::{
    cycle, cycle_misc, mem_read, mem_read_offset, mem_write, mem_write_offset, no_alu, no_idu,
    no_mem, AluCycle, IduCycle, Instruction, MCycle, Misc, MiscFlags, MAX_MCYCLES,
};
use crate::registers::RegisterOperand;

fn fetch_cycle() -> MCycle {
    cycle(
        no_alu(),
        IduCycle { op: IduOp::Inc, operand: RegisterOperand::Pc, dest: RegisterOperand::Pc },
        mem_read(RegisterOperand::Pc, RegisterOperand::Ir),
    )
}

fn alu_cycle(op: AluOp, a: RegisterOperand, b: RegisterOperand, dest: RegisterOperand) -> AluCycle {
    AluCycle { op, operand_a: a, operand_b: b, dest }
}

fn idu_cycle(op: IduOp, operand: RegisterOperand, dest: RegisterOperand) -> IduCycle {
    IduCycle { op, operand, dest }
}

/// Assembles an `Instruction` from the given execute cycles plus a trailing
/// fetch cycle. An empty `execute` list produces a single cycle in which
/// the fetch and the instruction's own (register-only) work are the same
/// M-cycle; callers fold their work into `cycles[0]` with `tap_fetch_alu`.
fn build(mnemonic: &'static str, mut execute: Vec<MCycle>) -> Instruction {
    execute.push(fetch_cycle());
    let len = execute.len();
    assert!(len <= MAX_MCYCLES, "{mnemonic} has more than {MAX_MCYCLES} M-cycles");
    execute[len - 1].misc.flags |= MiscFlags::LAST_CYCLE;
    let mut padded = [fetch_cycle(); MAX_MCYCLES];
    for (i, c) in execute.into_iter().enumerate() {
        padded[i] = c;
    }
    Instruction { len: len as u8, cycles: padded, mnemonic }
}

fn illegal() -> Instruction {
    build("ILLEGAL", vec![])
}

trait TapFetchAlu {
    fn tap_fetch_alu(self, op: AluOp, a: RegisterOperand, b: RegisterOperand, dest: RegisterOperand) -> Instruction;
}
impl TapFetchAlu for Instruction {
    fn tap_fetch_alu(mut self, op: AluOp, a: RegisterOperand, b: RegisterOperand, dest: RegisterOperand) -> Instruction {
        self.cycles[0].alu = alu_cycle(op, a, b, dest);
        self
    }
}

trait TapMisc {
    fn tap_halt(self) -> Instruction;
    fn tap_stop(self) -> Instruction;
    fn tap_di(self) -> Instruction;
    fn tap_ei(self) -> Instruction;
    fn tap_prefix_cb(self) -> Instruction;
    fn tap_clear_zero(self) -> Instruction;
}
impl TapMisc for Instruction {
    fn tap_halt(mut self) -> Instruction {
        self.cycles[0].misc.flags |= MiscFlags::HALT;
        self
    }
    fn tap_stop(mut self) -> Instruction {
        self.cycles[0].misc.flags |= MiscFlags::STOP;
        self
    }
    fn tap_di(mut self) -> Instruction {
        self.cycles[0].misc.flags |= MiscFlags::DISABLE_INTERRUPTS;
        self
    }
    fn tap_ei(mut self) -> Instruction {
        self.cycles[0].misc.flags |= MiscFlags::ENABLE_INTERRUPTS;
        self
    }
    fn tap_prefix_cb(mut self) -> Instruction {
        self.cycles[0].misc.flags |= MiscFlags::PREFIX_CB;
        self
    }
    fn tap_clear_zero(mut self) -> Instruction {
        self.cycles[0].misc.flags |= MiscFlags::ALU_CLEAR_ZERO;
        self
    }
}

/// Registers addressed by a 3-bit opcode field, in GB encoding order.
/// Index 6 ((HL)) has no direct register operand; callers special-case it.
const REG8: [RegisterOperand; 8] = [
    RegisterOperand::B,
    RegisterOperand::C,
    RegisterOperand::D,
    RegisterOperand::E,
    RegisterOperand::H,
    RegisterOperand::L,
    RegisterOperand::None,
    RegisterOperand::A,
];

const REG16_SP: [RegisterOperand; 4] = [RegisterOperand::Bc, RegisterOperand::De, RegisterOperand::Hl, RegisterOperand::Sp];
const REG16_AF: [RegisterOperand; 4] = [RegisterOperand::Bc, RegisterOperand::De, RegisterOperand::Hl, RegisterOperand::Af];

fn is_hl_indirect(idx: u8) -> bool {
    idx == 6
}

fn ld_r_r(dst: u8, src: u8) -> Instruction {
    match (is_hl_indirect(dst), is_hl_indirect(src)) {
        (false, false) => build("LD r,r'", vec![]).tap_fetch_alu(AluOp::Nop, REG8[src as usize], REG8[src as usize], REG8[dst as usize]),
        (false, true) => build("LD r,(HL)", vec![cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Hl, REG8[dst as usize]))]),
        (true, false) => build("LD (HL),r", vec![cycle(no_alu(), no_idu(), mem_write(REG8[src as usize], RegisterOperand::Hl))]),
        (true, true) => unreachable!("opcode 0x76 is HALT, handled separately"),
    }
}

fn ld_r_n(dst: u8) -> Instruction {
    if is_hl_indirect(dst) {
        build(
            "LD (HL),n",
            vec![
                cycle(no_alu(), idu_cycle(IduOp::Inc, RegisterOperand::Pc, RegisterOperand::Pc), mem_read(RegisterOperand::Pc, RegisterOperand::Z)),
                cycle(no_alu(), no_idu(), mem_write(RegisterOperand::Z, RegisterOperand::Hl)),
            ],
        )
    } else {
        build(
            "LD r,n",
            vec![cycle(no_alu(), idu_cycle(IduOp::Inc, RegisterOperand::Pc, RegisterOperand::Pc), mem_read(RegisterOperand::Pc, REG8[dst as usize]))],
        )
    }
}

fn alu_a_r(op: AluOp, src: u8) -> Instruction {
    if is_hl_indirect(src) {
        build(
            "ALU A,(HL)",
            vec![cycle(
                alu_cycle(op, RegisterOperand::A, RegisterOperand::Z, RegisterOperand::A),
                no_idu(),
                mem_read(RegisterOperand::Hl, RegisterOperand::Z),
            )],
        )
    } else {
        build("ALU A,r", vec![]).tap_fetch_alu(op, RegisterOperand::A, REG8[src as usize], RegisterOperand::A)
    }
}

fn alu_a_n(op: AluOp) -> Instruction {
    build(
        "ALU A,n",
        vec![cycle(
            alu_cycle(op, RegisterOperand::A, RegisterOperand::Z, RegisterOperand::A),
            idu_cycle(IduOp::Inc, RegisterOperand::Pc, RegisterOperand::Pc),
            mem_read(RegisterOperand::Pc, RegisterOperand::Z),
        )],
    )
}

fn inc_dec_r8(op: AluOp, idx: u8) -> Instruction {
    if is_hl_indirect(idx) {
        build(
            "INC/DEC (HL)",
            vec![
                cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Hl, RegisterOperand::Z)),
                cycle(alu_cycle(op, RegisterOperand::None, RegisterOperand::Z, RegisterOperand::Z), no_idu(), mem_write(RegisterOperand::Z, RegisterOperand::Hl)),
            ],
        )
    } else {
        build("INC/DEC r", vec![]).tap_fetch_alu(op, RegisterOperand::None, REG8[idx as usize], REG8[idx as usize])
    }
}

fn inc_dec_r16(op: IduOp, idx: u8) -> Instruction {
    build("INC/DEC rr", vec![cycle(no_alu(), idu_cycle(op, REG16_SP[idx as usize], REG16_SP[idx as usize]), no_mem())])
}

fn hi_half(rr: RegisterOperand) -> RegisterOperand {
    match rr {
        RegisterOperand::Bc => RegisterOperand::B,
        RegisterOperand::De => RegisterOperand::D,
        RegisterOperand::Hl => RegisterOperand::H,
        RegisterOperand::Af => RegisterOperand::A,
        RegisterOperand::Sp => RegisterOperand::SpHi,
        _ => RegisterOperand::None,
    }
}
fn lo_half(rr: RegisterOperand) -> RegisterOperand {
    match rr {
        RegisterOperand::Bc => RegisterOperand::C,
        RegisterOperand::De => RegisterOperand::E,
        RegisterOperand::Hl => RegisterOperand::L,
        RegisterOperand::Af => RegisterOperand::F,
        RegisterOperand::Sp => RegisterOperand::SpLo,
        _ => RegisterOperand::None,
    }
}

fn push_rr(idx: u8) -> Instruction {
    let rr = REG16_AF[idx as usize];
    build(
        "PUSH rr",
        vec![
            cycle(no_alu(), idu_cycle(IduOp::Dec, RegisterOperand::Sp, RegisterOperand::Sp), no_mem()),
            cycle(no_alu(), idu_cycle(IduOp::Dec, RegisterOperand::Sp, RegisterOperand::Sp), mem_write(hi_half(rr), RegisterOperand::Sp)),
            cycle(no_alu(), no_idu(), mem_write(lo_half(rr), RegisterOperand::Sp)),
        ],
    )
}

fn pop_rr(idx: u8) -> Instruction {
    let rr = REG16_AF[idx as usize];
    build(
        "POP rr",
        vec![
            cycle(no_alu(), idu_cycle(IduOp::Inc, RegisterOperand::Sp, RegisterOperand::Sp), mem_read(RegisterOperand::Sp, lo_half(rr))),
            cycle(no_alu(), idu_cycle(IduOp::Inc, RegisterOperand::Sp, RegisterOperand::Sp), mem_read(RegisterOperand::Sp, hi_half(rr))),
        ],
    )
}

fn cond_flag(idx: u8) -> MiscFlags {
    match idx {
        0 => MiscFlags::COND_NZ,
        1 => MiscFlags::COND_Z,
        2 => MiscFlags::COND_NC,
        3 => MiscFlags::COND_C,
        _ => unreachable!(),
    }
}

fn tap_inc_pc(mut c: MCycle) -> MCycle {
    c.idu = idu_cycle(IduOp::Inc, RegisterOperand::Pc, RegisterOperand::Pc);
    c
}

fn jr() -> Instruction {
    build(
        "JR e",
        vec![
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::Z))),
            cycle_misc(
                alu_cycle(AluOp::AddKeepZ, RegisterOperand::PcLo, RegisterOperand::Z, RegisterOperand::PcLo),
                idu_cycle(IduOp::Adjust, RegisterOperand::PcHi, RegisterOperand::PcHi),
                no_mem(),
                Misc { flags: MiscFlags::empty(), operand: RegisterOperand::PcLo, opt_value: 0 },
            ),
        ],
    )
}

fn jr_cc(idx: u8) -> Instruction {
    let mut inst = jr();
    inst.cycles[1].misc.flags |= cond_flag(idx);
    inst
}

fn jp_nn() -> Instruction {
    build(
        "JP nn",
        vec![
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::Z))),
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::W))),
            cycle_misc(no_alu(), no_idu(), no_mem(), Misc { flags: MiscFlags::WRITE_WZ_TO_WIDE, operand: RegisterOperand::Pc, opt_value: 0 }),
        ],
    )
}

fn jp_cc(idx: u8) -> Instruction {
    let mut inst = jp_nn();
    inst.cycles[2].misc.flags |= cond_flag(idx);
    inst
}

fn call_nn() -> Instruction {
    build(
        "CALL nn",
        vec![
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::Z))),
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::W))),
            cycle(no_alu(), idu_cycle(IduOp::Dec, RegisterOperand::Sp, RegisterOperand::Sp), no_mem()),
            cycle(no_alu(), idu_cycle(IduOp::Dec, RegisterOperand::Sp, RegisterOperand::Sp), mem_write(RegisterOperand::PcHi, RegisterOperand::Sp)),
            cycle_misc(no_alu(), no_idu(), mem_write(RegisterOperand::PcLo, RegisterOperand::Sp), Misc { flags: MiscFlags::WRITE_WZ_TO_WIDE, operand: RegisterOperand::Pc, opt_value: 0 }),
        ],
    )
}

fn call_cc(idx: u8) -> Instruction {
    let mut inst = call_nn();
    inst.cycles[2].misc.flags |= cond_flag(idx);
    inst
}

fn ret() -> Instruction {
    build(
        "RET",
        vec![
            cycle(no_alu(), idu_cycle(IduOp::Inc, RegisterOperand::Sp, RegisterOperand::Sp), mem_read(RegisterOperand::Sp, RegisterOperand::Z)),
            cycle(no_alu(), idu_cycle(IduOp::Inc, RegisterOperand::Sp, RegisterOperand::Sp), mem_read(RegisterOperand::Sp, RegisterOperand::W)),
            cycle_misc(no_alu(), no_idu(), no_mem(), Misc { flags: MiscFlags::WRITE_WZ_TO_WIDE, operand: RegisterOperand::Pc, opt_value: 0 }),
        ],
    )
}

fn reti() -> Instruction {
    let mut inst = ret();
    let last = inst.len as usize - 1;
    inst.cycles[last.saturating_sub(1)].misc.flags |= MiscFlags::ENABLE_INTERRUPTS;
    inst.mnemonic = "RETI";
    inst
}

fn ret_cc(idx: u8) -> Instruction {
    build(
        "RET cc",
        vec![
            cycle_misc(no_alu(), no_idu(), no_mem(), Misc { flags: cond_flag(idx), operand: RegisterOperand::None, opt_value: 0 }),
            cycle(no_alu(), idu_cycle(IduOp::Inc, RegisterOperand::Sp, RegisterOperand::Sp), mem_read(RegisterOperand::Sp, RegisterOperand::Z)),
            cycle(no_alu(), idu_cycle(IduOp::Inc, RegisterOperand::Sp, RegisterOperand::Sp), mem_read(RegisterOperand::Sp, RegisterOperand::W)),
            cycle_misc(no_alu(), no_idu(), no_mem(), Misc { flags: MiscFlags::WRITE_WZ_TO_WIDE, operand: RegisterOperand::Pc, opt_value: 0 }),
        ],
    )
}

fn rst(vector: u8) -> Instruction {
    build(
        "RST",
        vec![
            cycle(no_alu(), idu_cycle(IduOp::Dec, RegisterOperand::Sp, RegisterOperand::Sp), no_mem()),
            cycle(no_alu(), idu_cycle(IduOp::Dec, RegisterOperand::Sp, RegisterOperand::Sp), mem_write(RegisterOperand::PcHi, RegisterOperand::Sp)),
            cycle_misc(
                no_alu(),
                no_idu(),
                mem_write(RegisterOperand::PcLo, RegisterOperand::Sp),
                Misc { flags: MiscFlags::WRITE_OPT_VALUE_TO_WIDE, operand: RegisterOperand::Pc, opt_value: vector as u16 },
            ),
        ],
    )
}

fn rot_a(op: AluOp) -> Instruction {
    // RLCA/RLA/RRCA/RRA: same rotate as the CB form but Z always reads 0,
    // unlike CB's RLC/RL/RR which set Z from the result.
    build("ROT A", vec![]).tap_fetch_alu(op, RegisterOperand::None, RegisterOperand::A, RegisterOperand::A).tap_clear_zero()
}

fn cb_op(op: AluOp, idx: u8) -> Instruction {
    if is_hl_indirect(idx) {
        if matches!(op, AluOp::Bit(_)) {
            build(
                "CB BIT (HL)",
                vec![cycle(alu_cycle(op, RegisterOperand::None, RegisterOperand::Z, RegisterOperand::None), no_idu(), mem_read(RegisterOperand::Hl, RegisterOperand::Z))],
            )
        } else {
            build(
                "CB RMW (HL)",
                vec![
                    cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Hl, RegisterOperand::Z)),
                    cycle(alu_cycle(op, RegisterOperand::None, RegisterOperand::Z, RegisterOperand::Z), no_idu(), mem_write(RegisterOperand::Z, RegisterOperand::Hl)),
                ],
            )
        }
    } else {
        build("CB r", vec![]).tap_fetch_alu(op, RegisterOperand::None, REG8[idx as usize], REG8[idx as usize])
    }
}

pub fn build_default_table() -> Box<[Instruction; 256]> {
    let mut table: Vec<Instruction> = (0..256).map(|_| illegal()).collect();

    for dst in 0..8u8 {
        for src in 0..8u8 {
            let opcode = 0x40 + dst * 8 + src;
            if dst == 6 && src == 6 {
                table[opcode as usize] = build("HALT", vec![]).tap_halt();
            } else {
                table[opcode as usize] = ld_r_r(dst, src);
            }
        }
    }

    let quad2_ops = [AluOp::Add, AluOp::Adc, AluOp::Sub, AluOp::Sbc, AluOp::And, AluOp::Xor, AluOp::Or, AluOp::Cp];
    for (row, op) in quad2_ops.into_iter().enumerate() {
        for src in 0..8u8 {
            table[(0x80 + row as u8 * 8 + src) as usize] = alu_a_r(op, src);
        }
    }

    let quad3_alu_n = [
        (0xC6u8, AluOp::Add),
        (0xCE, AluOp::Adc),
        (0xD6, AluOp::Sub),
        (0xDE, AluOp::Sbc),
        (0xE6, AluOp::And),
        (0xEE, AluOp::Xor),
        (0xF6, AluOp::Or),
        (0xFE, AluOp::Cp),
    ];
    for (opcode, op) in quad3_alu_n {
        table[opcode as usize] = alu_a_n(op);
    }

    table[0x00] = build("NOP", vec![]);
    for row in 0..4u8 {
        let rr = REG16_SP[row as usize];
        table[(0x01 + row * 0x10) as usize] = build(
            "LD rr,nn",
            vec![
                tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, lo_half(rr)))),
                tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, hi_half(rr)))),
            ],
        );
        table[(0x03 + row * 0x10) as usize] = inc_dec_r16(IduOp::Inc, row);
        table[(0x0B + row * 0x10) as usize] = inc_dec_r16(IduOp::Dec, row);
    }
    table[0x02] = build("LD (BC),A", vec![cycle(no_alu(), no_idu(), mem_write(RegisterOperand::A, RegisterOperand::Bc))]);
    table[0x12] = build("LD (DE),A", vec![cycle(no_alu(), no_idu(), mem_write(RegisterOperand::A, RegisterOperand::De))]);
    table[0x22] = build(
        "LD (HL+),A",
        vec![cycle(no_alu(), idu_cycle(IduOp::Inc, RegisterOperand::Hl, RegisterOperand::Hl), mem_write(RegisterOperand::A, RegisterOperand::Hl))],
    );
    table[0x32] = build(
        "LD (HL-),A",
        vec![cycle(no_alu(), idu_cycle(IduOp::Dec, RegisterOperand::Hl, RegisterOperand::Hl), mem_write(RegisterOperand::A, RegisterOperand::Hl))],
    );
    table[0x0A] = build("LD A,(BC)", vec![cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Bc, RegisterOperand::A))]);
    table[0x1A] = build("LD A,(DE)", vec![cycle(no_alu(), no_idu(), mem_read(RegisterOperand::De, RegisterOperand::A))]);
    table[0x2A] = build(
        "LD A,(HL+)",
        vec![cycle(no_alu(), idu_cycle(IduOp::Inc, RegisterOperand::Hl, RegisterOperand::Hl), mem_read(RegisterOperand::Hl, RegisterOperand::A))],
    );
    table[0x3A] = build(
        "LD A,(HL-)",
        vec![cycle(no_alu(), idu_cycle(IduOp::Dec, RegisterOperand::Hl, RegisterOperand::Hl), mem_read(RegisterOperand::Hl, RegisterOperand::A))],
    );

    for idx in 0..8u8 {
        let opcode = 0x04 + idx * 8;
        table[opcode as usize] = inc_dec_r8(AluOp::Inc, idx);
        table[(opcode + 1) as usize] = inc_dec_r8(AluOp::Dec, idx);
        table[(opcode + 2) as usize] = ld_r_n(idx);
    }

    table[0x07] = rot_a(AluOp::Rlc);
    table[0x17] = rot_a(AluOp::Rl);
    table[0x0F] = rot_a(AluOp::Rrc);
    table[0x1F] = rot_a(AluOp::Rr);
    table[0x27] = build("DAA", vec![]).tap_fetch_alu(AluOp::Da, RegisterOperand::None, RegisterOperand::A, RegisterOperand::A);
    table[0x2F] = build("CPL", vec![]).tap_fetch_alu(AluOp::Cpl, RegisterOperand::None, RegisterOperand::A, RegisterOperand::A);
    table[0x37] = build("SCF", vec![]).tap_fetch_alu(AluOp::Scf, RegisterOperand::None, RegisterOperand::A, RegisterOperand::A);
    table[0x3F] = build("CCF", vec![]).tap_fetch_alu(AluOp::Ccf, RegisterOperand::None, RegisterOperand::A, RegisterOperand::A);

    table[0x08] = build(
        "LD (a16),SP",
        vec![
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::Z))),
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::W))),
            cycle(no_alu(), no_idu(), mem_write(RegisterOperand::SpLo, RegisterOperand::Wz)),
            cycle(no_alu(), idu_cycle(IduOp::Inc, RegisterOperand::Wz, RegisterOperand::Wz), mem_write(RegisterOperand::SpHi, RegisterOperand::Wz)),
        ],
    );

    table[0x18] = jr();
    table[0x20] = jr_cc(0);
    table[0x28] = jr_cc(1);
    table[0x30] = jr_cc(2);
    table[0x38] = jr_cc(3);
    table[0x10] = build("STOP", vec![]).tap_stop();

    for idx in 0..4u8 {
        table[(0xC0 + idx * 8) as usize] = ret_cc(idx);
        table[(0xC2 + idx * 8) as usize] = jp_cc(idx);
        table[(0xC4 + idx * 8) as usize] = call_cc(idx);
    }
    table[0xC9] = ret();
    table[0xD9] = reti();
    table[0xC3] = jp_nn();
    table[0xCD] = call_nn();
    // Internal register copy, no bus access of its own; the trailing fetch
    // (appended by `build`) reads from the jumped-to address since misc
    // writes apply after this cycle's (absent) mem access.
    table[0xE9] = build(
        "JP (HL)",
        vec![cycle_misc(
            no_alu(),
            no_idu(),
            no_mem(),
            Misc { flags: MiscFlags::WRITE_VALUE_TO_WIDE, operand: RegisterOperand::Pc, opt_value: 0 },
        )],
    );

    for idx in 0..4u8 {
        table[(0xC1 + idx * 0x10) as usize] = pop_rr(idx);
        table[(0xC5 + idx * 0x10) as usize] = push_rr(idx);
    }

    for n in 0..8u8 {
        table[(0xC7 + n * 8) as usize] = rst(n * 8);
    }

    table[0xE0] = build(
        "LDH (a8),A",
        vec![
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::Z))),
            cycle(no_alu(), no_idu(), mem_write_offset(RegisterOperand::A, RegisterOperand::Z)),
        ],
    );
    table[0xF0] = build(
        "LDH A,(a8)",
        vec![
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::Z))),
            cycle(no_alu(), no_idu(), mem_read_offset(RegisterOperand::Z, RegisterOperand::A)),
        ],
    );
    table[0xE2] = build("LD (C),A", vec![cycle(no_alu(), no_idu(), mem_write_offset(RegisterOperand::A, RegisterOperand::C))]);
    table[0xF2] = build("LD A,(C)", vec![cycle(no_alu(), no_idu(), mem_read_offset(RegisterOperand::C, RegisterOperand::A))]);

    table[0xEA] = build(
        "LD (a16),A",
        vec![
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::Z))),
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::W))),
            cycle(no_alu(), no_idu(), mem_write(RegisterOperand::A, RegisterOperand::Wz)),
        ],
    );
    table[0xFA] = build(
        "LD A,(a16)",
        vec![
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::Z))),
            tap_inc_pc(cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Pc, RegisterOperand::W))),
            cycle(no_alu(), no_idu(), mem_read(RegisterOperand::Wz, RegisterOperand::A)),
        ],
    );

    table[0xF3] = build("DI", vec![]).tap_di();
    table[0xFB] = build("EI", vec![]).tap_ei();

    table[0xE8] = build(
        "ADD SP,e",
        vec![
            tap_inc_pc(cycle(
                alu_cycle(AluOp::Add, RegisterOperand::SpLo, RegisterOperand::Z, RegisterOperand::Z),
                no_idu(),
                mem_read(RegisterOperand::Pc, RegisterOperand::Z),
            )),
            cycle(no_alu(), idu_cycle(IduOp::Adjust, RegisterOperand::SpHi, RegisterOperand::W), no_mem()),
            cycle_misc(no_alu(), no_idu(), no_mem(), Misc { flags: MiscFlags::WRITE_WZ_TO_WIDE, operand: RegisterOperand::Sp, opt_value: 0 }),
        ],
    )
    .tap_clear_zero();
    table[0xF8] = build(
        "LD HL,SP+e",
        vec![
            tap_inc_pc(cycle(
                alu_cycle(AluOp::Add, RegisterOperand::SpLo, RegisterOperand::Z, RegisterOperand::Z),
                no_idu(),
                mem_read(RegisterOperand::Pc, RegisterOperand::Z),
            )),
            cycle_misc(
                no_alu(),
                idu_cycle(IduOp::Adjust, RegisterOperand::SpHi, RegisterOperand::W),
                no_mem(),
                Misc { flags: MiscFlags::WRITE_WZ_TO_WIDE, operand: RegisterOperand::Hl, opt_value: 0 },
            ),
        ],
    )
    .tap_clear_zero();
    table[0xF9] = build("LD SP,HL", vec![cycle(no_alu(), idu_cycle(IduOp::Nop, RegisterOperand::Hl, RegisterOperand::Sp), no_mem())]);

    table[0xCB] = build("PREFIX CB", vec![]).tap_prefix_cb();

    let array: [Instruction; 256] = table.try_into().unwrap();
    Box::new(array)
}

pub fn build_cb_table() -> Box<[Instruction; 256]> {
    let mut table: Vec<Instruction> = (0..256).map(|_| illegal()).collect();
    let rot_ops = [AluOp::Rlc, AluOp::Rrc, AluOp::Rl, AluOp::Rr, AluOp::Sla, AluOp::Sra, AluOp::Swap, AluOp::Srl];
    for (row, op) in rot_ops.into_iter().enumerate() {
        for idx in 0..8u8 {
            table[row * 8 + idx as usize] = cb_op(op, idx);
        }
    }
    for bit in 0..8u8 {
        for idx in 0..8u8 {
            table[0x40 + bit as usize * 8 + idx as usize] = cb_op(AluOp::Bit(bit), idx);
            table[0x80 + bit as usize * 8 + idx as usize] = cb_op(AluOp::Res(bit), idx);
            table[0xC0 + bit as usize * 8 + idx as usize] = cb_op(AluOp::Set(bit), idx);
        }
    }
    let array: [Instruction; 256] = table.try_into().unwrap();
    Box::new(array)
}

/// The 5 M-cycle interrupt-dispatch sequence: disable IME, two internal
/// decrement cycles while SP is pushed down, write PC high, then write PC
/// low while latching the vector address into PC, followed by the fetch
/// of the handler's first opcode.
pub fn build_interrupt_instruction() -> Instruction {
    let mut padded = [fetch_cycle(); MAX_MCYCLES];
    padded[0] = cycle_misc(no_alu(), no_idu(), no_mem(), Misc { flags: MiscFlags::DISABLE_INTERRUPTS, operand: RegisterOperand::None, opt_value: 0 });
    padded[1] = cycle(no_alu(), idu_cycle(IduOp::Dec, RegisterOperand::Sp, RegisterOperand::Sp), no_mem());
    padded[2] = cycle(no_alu(), idu_cycle(IduOp::Dec, RegisterOperand::Sp, RegisterOperand::Sp), mem_write(RegisterOperand::PcHi, RegisterOperand::Sp));
    padded[3] = cycle_misc(
        no_alu(),
        no_idu(),
        mem_write(RegisterOperand::PcLo, RegisterOperand::Sp),
        Misc { flags: MiscFlags::WRITE_OPT_VALUE_TO_WIDE, operand: RegisterOperand::Pc, opt_value: 0 },
    );
    padded[4].misc.flags |= MiscFlags::LAST_CYCLE;
    Instruction { len: 5, cycles: padded, mnemonic: "INTERRUPT" }
}

lazy_static::lazy_static! {
    static ref DEFAULT_TABLE: Box<[Instruction; 256]> = build_default_table();
    static ref CB_TABLE: Box<[Instruction; 256]> = build_cb_table();
    static ref INTERRUPT_INSTRUCTION: Instruction = build_interrupt_instruction();
}

pub fn get_instruction(table: crate::mcycle::InstructionTable, opcode: u8) -> Instruction {
    use crate::mcycle::InstructionTable::*;
    match table {
        Default => DEFAULT_TABLE[opcode as usize],
        PrefixCb => CB_TABLE[opcode as usize],
        Interrupt => *INTERRUPT_INSTRUCTION,
    }
}

pub fn get_m_cycle(table: crate::mcycle::InstructionTable, opcode: u8, index: u8) -> MCycle {
    get_instruction(table, opcode).cycles[index as usize]
}

pub fn get_m_cycle_count(table: crate::mcycle::InstructionTable, opcode: u8) -> u8 {
    get_instruction(table, opcode).len
}

pub fn get_fetch_m_cycle() -> MCycle {
    fetch_cycle()
}

pub fn get_opcode_name(table: crate::mcycle::InstructionTable, opcode: u8) -> &'static str {
    get_instruction(table, opcode).mnemonic
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcycle::InstructionTable;

    #[test]
    fn nop_is_single_cycle() {
        assert_eq!(get_m_cycle_count(InstructionTable::Default, 0x00), 1);
    }

    #[test]
    fn ld_r_n_is_two_cycles() {
        assert_eq!(get_m_cycle_count(InstructionTable::Default, 0x06), 2); // LD B,n
    }

    #[test]
    fn call_is_six_cycles() {
        assert_eq!(get_m_cycle_count(InstructionTable::Default, 0xCD), 6);
    }

    #[test]
    fn push_is_four_cycles() {
        assert_eq!(get_m_cycle_count(InstructionTable::Default, 0xC5), 4);
    }

    #[test]
    fn pop_is_three_cycles() {
        assert_eq!(get_m_cycle_count(InstructionTable::Default, 0xC1), 3);
    }

    #[test]
    fn jr_is_three_cycles() {
        assert_eq!(get_m_cycle_count(InstructionTable::Default, 0x18), 3);
    }

    #[test]
    fn ret_cc_is_five_cycles() {
        assert_eq!(get_m_cycle_count(InstructionTable::Default, 0xC0), 5);
    }

    #[test]
    fn cb_bit_hl_is_two_cycles_after_prefix() {
        // Plus the 1 M-cycle PREFIX_CB spent fetching this opcode byte,
        // BIT 0,(HL) totals 3 M-cycles, matching published GB timing.
        assert_eq!(get_m_cycle_count(InstructionTable::PrefixCb, 0x46), 2);
    }

    #[test]
    fn cb_register_op_is_one_cycle_after_prefix() {
        // Plus PREFIX_CB's own fetch cycle, RLC B totals 2 M-cycles.
        assert_eq!(get_m_cycle_count(InstructionTable::PrefixCb, 0x00), 1);
    }

    #[test]
    fn prefix_cb_itself_is_one_cycle() {
        assert_eq!(get_m_cycle_count(InstructionTable::Default, 0xCB), 1);
    }

    #[test]
    fn cb_read_modify_write_hl_is_four_cycles_total_including_prefix() {
        // RES 0,(HL): 1 M-cycle for the 0xCB prefix fetch (which already
        // loads this secondary opcode byte) + read (HL) + a write-back
        // cycle fused with the ALU op and the next instruction's fetch.
        assert_eq!(get_m_cycle_count(InstructionTable::PrefixCb, 0x86), 3);
    }

    #[test]
    fn jp_hl_has_no_bus_access_on_its_jump_cycle() {
        let inst = get_instruction(InstructionTable::Default, 0xE9);
        assert!(!inst.cycles[0].mem.is_active());
    }

    #[test]
    fn interrupt_sequence_is_five_cycles() {
        assert_eq!(get_m_cycle_count(InstructionTable::Interrupt, 0), 5);
    }

    #[test]
    fn every_default_opcode_has_a_mnemonic() {
        for op in 0..=255u8 {
            assert!(!get_opcode_name(InstructionTable::Default, op).is_empty());
        }
    }
}
