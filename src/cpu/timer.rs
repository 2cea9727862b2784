//! DIV/TIMA/TMA/TAC: the free-running 16-bit system counter and the
//! falling-edge-triggered TIMA increment built on top of it. Grounded on
//! the `DIV_ADDR`/`TIMA_ADDR`/`TMA_ADDR`/`TAC_ADDR` constants in
//! `memory_map.rs`; the falling-edge selection bit table matches Pandocs'
//! documented TAC behavior, which the original spec leaves implicit.

use crate::peripheral_io::{InterruptFlags, PeripheralIo, DIV, TAC, TIMA, TMA};

const TAC_ENABLE: u8 = 0x04;

fn selected_bit(tac: u8) -> u8 {
    match tac & 0x03 {
        0 => 9, // every 1024 T-cycles -> 4096 Hz
        1 => 3, // every 16 T-cycles -> 262144 Hz
        2 => 5, // every 64 T-cycles -> 65536 Hz
        3 => 7, // every 256 T-cycles -> 16384 Hz
        _ => unreachable!(),
    }
}

/// The 16-bit system counter; DIV is its top 8 bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct Timer {
    system_counter: u16,
}

impl Timer {
    pub fn new() -> Self {
        Timer { system_counter: 0 }
    }

    pub fn reset(&mut self, io: &mut PeripheralIo) {
        self.system_counter = 0;
        io.set_raw(DIV, 0);
    }

    /// Advances the system counter by one T-cycle, incrementing TIMA on
    /// each falling edge of the TAC-selected bit while the timer is enabled,
    /// and requesting the timer interrupt on TIMA overflow.
    pub fn tick_t_cycle(&mut self, io: &mut PeripheralIo) {
        let tac = io.tac();
        let bit = selected_bit(tac);
        let before = (self.system_counter >> bit) & 1;
        self.system_counter = self.system_counter.wrapping_add(1);
        io.set_raw(DIV, (self.system_counter >> 8) as u8);
        let after = (self.system_counter >> bit) & 1;

        if tac & TAC_ENABLE != 0 && before == 1 && after == 0 {
            let (next, overflowed) = io.tima().overflowing_add(1);
            if overflowed {
                io.set_tima(io.tma());
                io.set_if_flags(io.if_flags() | InterruptFlags::TIMER);
            } else {
                io.set_tima(next);
            }
        }
    }
}
