//! Minimal cartridge mapper hook: a latch register plus a bank-switch
//! trait. Cartridge header parsing and full MBC1/MBC3 bank-switching logic
//! are out of scope for this core (see DESIGN.md); this module keeps just
//! enough to let the MMU route ROM-space writes somewhere, grounded on
//! `mbc.rs`'s `MbcType` cartridge-header table.

use crate::mmu::{Mmu, SegmentFlags};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MbcType {
    NoMbc,
    Mbc1,
    Mbc3,
}

impl MbcType {
    pub fn from_header(cartridge_type_code: u8) -> (Self, bool, bool) {
        match cartridge_type_code {
            0x00 => (MbcType::NoMbc, false, false),
            0x01 => (MbcType::Mbc1, false, false),
            0x02 => (MbcType::Mbc1, true, false),
            0x03 => (MbcType::Mbc1, true, true),
            0x08 => (MbcType::NoMbc, true, false),
            0x09 => (MbcType::NoMbc, true, true),
            0x0F => (MbcType::Mbc3, false, true),
            0x10 => (MbcType::Mbc3, true, true),
            0x11 => (MbcType::Mbc3, false, false),
            0x12 => (MbcType::Mbc3, true, false),
            0x13 => (MbcType::Mbc3, true, true),
            other => panic!("unsupported cartridge type: {other:#04X}"),
        }
    }
}

/// The last `(address, value)` pair written into ROM space, for a host-side
/// mapper implementation to act on.
#[derive(Debug, Clone, Copy, Default)]
pub struct MapperLatch {
    pub last_address: u16,
    pub last_value: u8,
}

impl MapperLatch {
    pub fn record(&mut self, address: u16, value: u8) {
        self.last_address = address;
        self.last_value = value;
    }
}

/// A cartridge bank-switch chip the host keeps alive and asks to remap ROM
/// or RAM segments into the bus as banking writes are observed. This core
/// ships only [`NoMbc`]; MBC1/MBC3 banking logic lives outside the core.
pub trait BankSwitcher {
    fn on_rom_write(&mut self, mmu: &mut Mmu, latch: MapperLatch);
}

/// The no-op mapper for `MbcType::NoMbc`: a single fixed 32 KiB ROM bank,
/// no RAM, all writes ignored.
pub struct NoMbc;

impl BankSwitcher for NoMbc {
    fn on_rom_write(&mut self, _mmu: &mut Mmu, _latch: MapperLatch) {}
}

/// Maps a fixed cartridge ROM image into `0x0000-0x7FFF` as read-only,
/// unbanked memory.
///
/// # Safety
/// `rom` must remain valid and unmoved for as long as the mapping stays
/// installed.
pub unsafe fn map_rom_only(mmu: &mut Mmu, rom: &mut [u8]) {
    assert!(rom.len() >= 0x8000, "ROM-only cartridges need at least 32 KiB");
    mmu.map(0x0000, 0x8000, rom.as_mut_ptr(), SegmentFlags::READ_ONLY);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_decodes_mbc1_ram_battery() {
        let (kind, ram, battery) = MbcType::from_header(0x03);
        assert_eq!(kind, MbcType::Mbc1);
        assert!(ram && battery);
    }

    #[test]
    fn latch_records_most_recent_write() {
        let mut latch = MapperLatch::default();
        latch.record(0x2000, 0x03);
        assert_eq!(latch.last_address, 0x2000);
        assert_eq!(latch.last_value, 0x03);
    }

    #[test]
    fn no_mbc_ignores_writes() {
        let mut rom = vec![0xAAu8; 0x8000];
        let mut mmu = Mmu::new();
        unsafe { map_rom_only(&mut mmu, &mut rom) };
        let mut mapper = NoMbc;
        mapper.on_rom_write(&mut mmu, MapperLatch::default());
        assert_eq!(mmu.read(0x0000), 0xAA);
    }
}
