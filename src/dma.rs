//! The OAM DMA unit: a 640-dot transfer that copies 160 bytes from
//! `(source<<8)..` to OAM, locking VRAM/OAM/WRAM(+echo) for its duration.
//! Grounded on `DMA.hpp`/`DMA.cpp`'s `DMACtrl`/`TickOAMDMA`.

use crate::mmu::Mmu;
use crate::peripheral_io::PeripheralIo;

const TRANSFER_DOTS: u16 = 640;
const LOCKED_REGIONS: [(u16, u32); 6] = [
    (0x8000, 0x2000), // VRAM
    (0xFE00, 0x0100), // OAM
    (0xC000, 0x1000), // WRAM bank 0
    (0xD000, 0x1000), // WRAM bank 1
    (0xE000, 0x1000), // echo of C000
    (0xF000, 0x1000), // echo of D000
];

/// Tracks an in-flight OAM DMA transfer. `last_source` mirrors the
/// original's `_lastDMARegValue`: a new transfer starts whenever the OAM_DMA
/// register reads differently than the value this unit last latched.
#[derive(Debug, Clone, Default)]
pub struct Dma {
    active: bool,
    dots: u16,
    last_source: u8,
}

impl Dma {
    pub fn new() -> Self {
        Dma::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advances the transfer by one dot. Call once per T-cycle, the same
    /// rate as the CPU timer and PPU.
    pub fn tick(&mut self, mmu: &mut Mmu, io: &mut PeripheralIo) {
        let source = io.oam_dma_source();
        if source != self.last_source {
            for (addr, size) in LOCKED_REGIONS {
                mmu.lock_for_dma(addr, size);
            }
            self.active = true;
            self.dots = 0;
            self.last_source = source;
        }

        if !self.active {
            return;
        }

        if self.dots % 4 == 0 {
            let offset = self.dots / 4;
            let src = ((self.last_source as u16) << 8) + offset;
            let dest = 0xFE00 + offset;
            let value = mmu.read(src);
            mmu.write(dest, value);
        }

        self.dots += 1;
        if self.dots >= TRANSFER_DOTS {
            self.active = false;
            self.dots = 0;
            self.last_source = 0;
            io.set_raw(crate::peripheral_io::OAM_DMA, 0);
            for (addr, size) in LOCKED_REGIONS {
                mmu.unlock_for_dma(addr, size);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mmu::SegmentFlags;

    #[test]
    fn transfer_copies_160_bytes_and_clears_register() {
        let mut mmu = Mmu::new();
        let mut io = PeripheralIo::new();
        let mut src = [0xABu8; 256];
        let mut oam = [0u8; 256];
        unsafe {
            mmu.map(0x9F00, 256, src.as_mut_ptr(), SegmentFlags::empty());
            mmu.map(0xFE00, 256, oam.as_mut_ptr(), SegmentFlags::empty());
        }
        io.set_raw(crate::peripheral_io::OAM_DMA, 0x9F);
        let mut dma = Dma::new();
        for _ in 0..TRANSFER_DOTS {
            dma.tick(&mut mmu, &mut io);
        }
        assert!(!dma.is_active());
        assert_eq!(io.oam_dma_source(), 0);
        assert_eq!(mmu.read(0xFE00), 0xAB);
    }

    #[test]
    fn locks_vram_during_transfer() {
        let mut mmu = Mmu::new();
        let mut io = PeripheralIo::new();
        let mut vram = [0x11u8; 8192];
        let mut oam = [0u8; 256];
        unsafe {
            mmu.map(0x8000, 8192, vram.as_mut_ptr(), SegmentFlags::empty());
            mmu.map(0xFE00, 256, oam.as_mut_ptr(), SegmentFlags::empty());
        }
        io.set_raw(crate::peripheral_io::OAM_DMA, 0x00);
        let mut dma = Dma::new();
        dma.tick(&mut mmu, &mut io);
        assert_eq!(mmu.read(0x8000), 0xFF);
    }
}
