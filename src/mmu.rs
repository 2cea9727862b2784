//! 256-segment bus. Each segment is 256 bytes; segment 256 is the redirect
//! slot used for the boot-ROM overlay. Grounded on `MMU.hpp`/`MMU.cpp` in
//! the original source. Segments are raw pointers into host-owned backing
//! memory (ROM banks, WRAM, VRAM, OAM, the peripheral IO block) rather than
//! owned storage, so the bus can alias the same backing array from two
//! address ranges (WRAM/echo RAM) without copying.

pub const SEGMENT_SIZE: usize = 256;
pub const SEGMENT_COUNT: usize = (64 * 1024) / SEGMENT_SIZE;
/// Index 256 is the always-present redirect slot (not a real address range).
pub const REDIRECT_SLOT: usize = SEGMENT_COUNT;

bitflags::bitflags! {
    #[derive(Default)]
    pub struct SegmentFlags: u8 {
        const READ_ONLY = 0x01;
        const REDIRECT  = 0x02;
        const DMA_LOCK  = 0x04;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rw {
    Read,
    Write,
}

/// A raw pointer to host-owned backing memory for one 256-byte segment, plus
/// its length so a caller can map a region wider than one segment as a run
/// of consecutive slot pointers.
#[derive(Clone, Copy)]
struct Segment {
    ptr: *mut u8,
}

/// 256 real segments + 1 redirect slot, each with independent flags.
pub struct Mmu {
    segments: [Option<Segment>; SEGMENT_COUNT + 1],
    flags: [SegmentFlags; SEGMENT_COUNT + 1],
    pub last_address: u16,
    pub last_data: u8,
    pub last_rw: Rw,
}

impl Mmu {
    pub fn new() -> Self {
        Mmu {
            segments: [None; SEGMENT_COUNT + 1],
            flags: [SegmentFlags::empty(); SEGMENT_COUNT + 1],
            last_address: 0,
            last_data: 0,
            last_rw: Rw::Read,
        }
    }

    fn assert_aligned(address: u16, size: u32) {
        assert!(
            address as u32 % SEGMENT_SIZE as u32 == 0,
            "MMU mapping address {:#06X} is not 256-byte aligned",
            address
        );
        assert!(
            size > 0 && size % SEGMENT_SIZE as u32 == 0,
            "MMU mapping size {} is not a non-zero multiple of 256",
            size
        );
        assert!(
            address as u32 + size <= 0x1_0000,
            "MMU mapping [{:#06X}, +{}) exceeds the 64 KiB address space",
            address,
            size
        );
    }

    /// Maps `size` bytes of host memory at `ptr` starting at `address`.
    /// `ptr` must stay valid for as long as the mapping is installed; the
    /// caller (the cartridge, WRAM owner, VRAM/OAM owner, etc) retains
    /// ownership.
    ///
    /// # Safety
    /// `ptr` must point to at least `size` valid, writable bytes that the
    /// caller keeps alive and does not alias mutably elsewhere while mapped.
    pub unsafe fn map(&mut self, address: u16, size: u32, ptr: *mut u8, flags: SegmentFlags) {
        Self::assert_aligned(address, size);
        let start = address as usize / SEGMENT_SIZE;
        let count = size as usize / SEGMENT_SIZE;
        for i in 0..count {
            self.segments[start + i] = Some(Segment {
                ptr: ptr.add(i * SEGMENT_SIZE),
            });
            self.flags[start + i] = flags;
        }
    }

    pub fn unmap(&mut self, address: u16, size: u32) {
        Self::assert_aligned(address, size);
        let start = address as usize / SEGMENT_SIZE;
        let count = size as usize / SEGMENT_SIZE;
        for i in 0..count {
            self.segments[start + i] = None;
            self.flags[start + i] = SegmentFlags::empty();
        }
    }

    /// # Safety
    /// Same contract as [`Mmu::map`], applied to the 256-byte redirect slot.
    pub unsafe fn redirect_zero(&mut self, ptr: *mut u8) {
        self.flags[0] |= SegmentFlags::REDIRECT;
        self.segments[REDIRECT_SLOT] = Some(Segment { ptr });
        self.flags[REDIRECT_SLOT] = SegmentFlags::READ_ONLY;
    }

    pub fn remove_zero_redirect(&mut self) {
        self.segments[REDIRECT_SLOT] = None;
        self.flags[REDIRECT_SLOT] = SegmentFlags::empty();
        self.flags[0] &= !SegmentFlags::REDIRECT;
    }

    pub fn lock_for_dma(&mut self, address: u16, size: u32) {
        Self::assert_aligned(address, size);
        let start = address as usize / SEGMENT_SIZE;
        let count = size as usize / SEGMENT_SIZE;
        for i in 0..count {
            self.flags[start + i] |= SegmentFlags::DMA_LOCK;
        }
    }

    pub fn unlock_for_dma(&mut self, address: u16, size: u32) {
        Self::assert_aligned(address, size);
        let start = address as usize / SEGMENT_SIZE;
        let count = size as usize / SEGMENT_SIZE;
        for i in 0..count {
            self.flags[start + i] &= !SegmentFlags::DMA_LOCK;
        }
    }

    fn resolve(&self, address: u16) -> usize {
        let mut idx = address as usize / SEGMENT_SIZE;
        if self.flags[idx].contains(SegmentFlags::REDIRECT) {
            idx = REDIRECT_SLOT;
        }
        idx
    }

    pub fn read(&mut self, address: u16) -> u8 {
        self.last_address = address;
        self.last_rw = Rw::Read;
        let idx = self.resolve(address);
        let value = match self.segments[idx] {
            Some(seg) if !self.flags[idx].contains(SegmentFlags::DMA_LOCK) => {
                let offset = address as usize % SEGMENT_SIZE;
                // SAFETY: ptr was registered via `map`/`redirect_zero`, whose
                // caller contract guarantees SEGMENT_SIZE valid bytes.
                unsafe { *seg.ptr.add(offset) }
            }
            _ => 0xFF,
        };
        self.last_data = value;
        value
    }

    pub fn write(&mut self, address: u16, value: u8) {
        self.last_address = address;
        self.last_data = value;
        self.last_rw = Rw::Write;
        let idx = self.resolve(address);
        let blocked = self.flags[idx]
            .intersects(SegmentFlags::READ_ONLY | SegmentFlags::DMA_LOCK)
            || self.segments[idx].is_none();
        if blocked {
            return;
        }
        let offset = address as usize % SEGMENT_SIZE;
        // SAFETY: see `read`.
        unsafe { *self.segments[idx].unwrap().ptr.add(offset) = value };
    }
}

impl Default for Mmu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_after_write_round_trips() {
        let mut backing = [0u8; 256];
        let mut mmu = Mmu::new();
        unsafe { mmu.map(0xC000, 256, backing.as_mut_ptr(), SegmentFlags::empty()) };
        mmu.write(0xC012, 0x55);
        assert_eq!(mmu.read(0xC012), 0x55);
        assert_eq!(backing[0x12], 0x55);
    }

    #[test]
    fn echo_ram_aliases_same_backing() {
        let mut backing = [0u8; 256];
        let mut mmu = Mmu::new();
        unsafe {
            mmu.map(0xC000, 256, backing.as_mut_ptr(), SegmentFlags::empty());
            mmu.map(0xE000, 256, backing.as_mut_ptr(), SegmentFlags::empty());
        }
        mmu.write(0xC012, 0x55);
        assert_eq!(mmu.read(0xE012), 0x55);
    }

    #[test]
    fn unmapped_region_reads_as_ff_after_unmap() {
        let mut backing = [0u8; 256];
        let mut mmu = Mmu::new();
        unsafe { mmu.map(0xC000, 256, backing.as_mut_ptr(), SegmentFlags::empty()) };
        mmu.unmap(0xC000, 256);
        for k in 0..256u16 {
            assert_eq!(mmu.read(0xC000 + k), 0xFF);
        }
    }

    #[test]
    fn read_only_segment_drops_writes() {
        let mut backing = [0xAAu8; 256];
        let mut mmu = Mmu::new();
        unsafe { mmu.map(0x0000, 256, backing.as_mut_ptr(), SegmentFlags::READ_ONLY) };
        mmu.write(0x0000, 0x00);
        assert_eq!(mmu.read(0x0000), 0xAA);
    }

    #[test]
    #[should_panic]
    fn misaligned_map_panics() {
        let mut b = [0u8; 256];
        let mut mmu = Mmu::new();
        unsafe { mmu.map(0x0010, 256, b.as_mut_ptr(), SegmentFlags::empty()) };
    }
}
