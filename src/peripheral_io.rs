//! The `0xFF00..=0xFFFF` peripheral register block: joypad, serial, timer,
//! audio, LCD, boot ROM control, CGB switches, HRAM and IE, addressed as one
//! 256-byte segment so it can be mapped into the MMU with a single call.
//! Field offsets are grounded on `memory_map.rs`'s address-constant table.

pub const JOYP: u8 = 0x00;
pub const SB: u8 = 0x01;
pub const SC: u8 = 0x02;
pub const DIV: u8 = 0x04;
pub const TIMA: u8 = 0x05;
pub const TMA: u8 = 0x06;
pub const TAC: u8 = 0x07;
pub const IF: u8 = 0x0F;
pub const NR10: u8 = 0x10;
pub const NR11: u8 = 0x11;
pub const NR12: u8 = 0x12;
pub const NR13: u8 = 0x13;
pub const NR14: u8 = 0x14;
pub const NR21: u8 = 0x16;
pub const NR22: u8 = 0x17;
pub const NR23: u8 = 0x18;
pub const NR24: u8 = 0x19;
pub const NR30: u8 = 0x1A;
pub const NR31: u8 = 0x1B;
pub const NR32: u8 = 0x1C;
pub const NR33: u8 = 0x1D;
pub const NR34: u8 = 0x1E;
pub const NR41: u8 = 0x20;
pub const NR42: u8 = 0x21;
pub const NR43: u8 = 0x22;
pub const NR44: u8 = 0x23;
pub const NR50: u8 = 0x24;
pub const NR51: u8 = 0x25;
pub const NR52: u8 = 0x26;
pub const WAVE_RAM_START: u8 = 0x30;
pub const WAVE_RAM_END: u8 = 0x3F;
pub const LCDC: u8 = 0x40;
pub const STAT: u8 = 0x41;
pub const SCY: u8 = 0x42;
pub const SCX: u8 = 0x43;
pub const LY: u8 = 0x44;
pub const LYC: u8 = 0x45;
pub const OAM_DMA: u8 = 0x46;
pub const BGP: u8 = 0x47;
pub const OBP0: u8 = 0x48;
pub const OBP1: u8 = 0x49;
pub const WY: u8 = 0x4A;
pub const WX: u8 = 0x4B;
pub const BOOT_CTRL: u8 = 0x50;
pub const HDMA1: u8 = 0x51;
pub const HDMA2: u8 = 0x52;
pub const HDMA3: u8 = 0x53;
pub const HDMA4: u8 = 0x54;
pub const HDMA5: u8 = 0x55;
pub const BCPS: u8 = 0x68;
pub const BCPD: u8 = 0x69;
pub const OCPS: u8 = 0x6A;
pub const OCPD: u8 = 0x6B;
pub const SVBK: u8 = 0x70;
pub const HRAM_START: u8 = 0x80;
pub const HRAM_END: u8 = 0xFE;
pub const IE: u8 = 0xFF;

bitflags::bitflags! {
    #[derive(Default)]
    pub struct InterruptFlags: u8 {
        const VBLANK  = 0x01;
        const STAT    = 0x02;
        const TIMER   = 0x04;
        const SERIAL  = 0x08;
        const JOYPAD  = 0x10;
    }
}

bitflags::bitflags! {
    #[derive(Default)]
    pub struct Lcdc: u8 {
        const BG_WINDOW_ENABLE = 0x01;
        const OBJ_ENABLE       = 0x02;
        const OBJ_SIZE         = 0x04;
        const BG_TILE_MAP      = 0x08;
        const BG_WINDOW_TILES  = 0x10;
        const WINDOW_ENABLE    = 0x20;
        const WINDOW_TILE_MAP  = 0x40;
        const LCD_ENABLE       = 0x80;
    }
}

bitflags::bitflags! {
    #[derive(Default)]
    pub struct Stat: u8 {
        const MODE_LO       = 0x01;
        const MODE_HI       = 0x02;
        const LYC_EQ_LY     = 0x04;
        const MODE0_IRQ     = 0x08;
        const MODE1_IRQ     = 0x10;
        const MODE2_IRQ     = 0x20;
        const LYC_IRQ       = 0x40;
    }
}

/// Backing storage for the whole `0xFF00-0xFFFF` segment. Plain byte array
/// plus typed accessors for the registers the CPU/PPU/DMA units care about;
/// everything else (audio, CGB palettes) is exposed only as raw bytes since
/// this core does not synthesize audio or render CGB palettes.
pub struct PeripheralIo {
    bytes: [u8; 256],
}

impl PeripheralIo {
    pub fn new() -> Self {
        // Padding slots (and every register without a documented power-on
        // value) read as 0xFF; named registers below stamp their own value
        // over this default.
        let mut bytes = [0xFFu8; 256];
        bytes[JOYP as usize] = 0xCF;
        bytes[TAC as usize] = 0xF8;
        bytes[IF as usize] = 0xE1;
        bytes[STAT as usize] = 0x85;
        bytes[NR52 as usize] = 0xF1;
        // LY is PPU-driven, not a latch with an arbitrary reset value: the
        // scanline counter starts at 0 alongside the PPU's own dot counter.
        bytes[LY as usize] = 0x00;
        PeripheralIo { bytes }
    }

    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.bytes.as_mut_ptr()
    }

    pub fn raw(&self, offset: u8) -> u8 {
        self.bytes[offset as usize]
    }

    pub fn set_raw(&mut self, offset: u8, value: u8) {
        self.bytes[offset as usize] = value;
    }

    pub fn lcdc(&self) -> Lcdc {
        Lcdc::from_bits_truncate(self.bytes[LCDC as usize])
    }
    pub fn stat(&self) -> Stat {
        Stat::from_bits_truncate(self.bytes[STAT as usize])
    }
    pub fn set_stat(&mut self, stat: Stat) {
        self.bytes[STAT as usize] = stat.bits() | 0x80;
    }
    pub fn ly(&self) -> u8 {
        self.bytes[LY as usize]
    }
    pub fn set_ly(&mut self, value: u8) {
        self.bytes[LY as usize] = value;
    }
    pub fn lyc(&self) -> u8 {
        self.bytes[LYC as usize]
    }
    pub fn scy(&self) -> u8 {
        self.bytes[SCY as usize]
    }
    pub fn scx(&self) -> u8 {
        self.bytes[SCX as usize]
    }
    pub fn wy(&self) -> u8 {
        self.bytes[WY as usize]
    }
    pub fn wx(&self) -> u8 {
        self.bytes[WX as usize]
    }
    pub fn bgp(&self) -> u8 {
        self.bytes[BGP as usize]
    }
    pub fn obp0(&self) -> u8 {
        self.bytes[OBP0 as usize]
    }
    pub fn obp1(&self) -> u8 {
        self.bytes[OBP1 as usize]
    }

    pub fn if_flags(&self) -> InterruptFlags {
        InterruptFlags::from_bits_truncate(self.bytes[IF as usize])
    }
    pub fn set_if_flags(&mut self, flags: InterruptFlags) {
        self.bytes[IF as usize] = flags.bits() | 0xE0;
    }
    pub fn ie_flags(&self) -> InterruptFlags {
        InterruptFlags::from_bits_truncate(self.bytes[IE as usize])
    }

    pub fn div(&self) -> u8 {
        self.bytes[DIV as usize]
    }
    pub fn tima(&self) -> u8 {
        self.bytes[TIMA as usize]
    }
    pub fn set_tima(&mut self, value: u8) {
        self.bytes[TIMA as usize] = value;
    }
    pub fn tma(&self) -> u8 {
        self.bytes[TMA as usize]
    }
    pub fn tac(&self) -> u8 {
        self.bytes[TAC as usize]
    }

    pub fn oam_dma_source(&self) -> u8 {
        self.bytes[OAM_DMA as usize]
    }

    pub fn boot_ctrl(&self) -> u8 {
        self.bytes[BOOT_CTRL as usize]
    }

    /// `true` once software has ever written a nonzero value: boot ROM
    /// unmapping is one-way, so the MMU only needs to check this once per
    /// write rather than remembering the exact value written.
    pub fn boot_rom_disabled(&self, value: u8) -> bool {
        value != 0
    }
}

impl Default for PeripheralIo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_defaults_match_hardware() {
        let io = PeripheralIo::new();
        assert_eq!(io.raw(JOYP), 0xCF);
        assert_eq!(io.raw(NR52), 0xF1);
    }

    #[test]
    fn if_flags_always_read_with_top_bits_set() {
        let mut io = PeripheralIo::new();
        io.set_if_flags(InterruptFlags::VBLANK);
        assert_eq!(io.raw(IF), 0xE1);
    }

    #[test]
    fn stat_write_forces_bit7() {
        let mut io = PeripheralIo::new();
        io.set_stat(Stat::MODE0_IRQ);
        assert_eq!(io.raw(STAT) & 0x80, 0x80);
    }
}
