//! A cycle-accurate Sharp SM83 core: CPU, MMU, PPU and OAM DMA, wired
//! together by [`System`]. Grounded on the teacher's own `lib.rs`, which
//! exposes its `Cpu`/`Ppu`/`MemoryBus` types and leaves windowing to the
//! `app` front end; this crate keeps that split, pushing all SDL concerns
//! into the `demos/` binary crate and leaving the library itself
//! sink-agnostic (it logs through `log`, never opens a window or a file).

pub mod alu;
pub mod cpu;
pub mod dma;
pub mod error;
pub mod idu;
pub mod instruction_table;
pub mod mbc;
pub mod mcycle;
pub mod mmu;
pub mod peripheral_io;
pub mod ppu;
pub mod registers;

pub use cpu::Cpu;
pub use dma::Dma;
pub use error::{CoreError, CoreResult};
pub use instruction_table::get_opcode_name;
pub use mbc::{map_rom_only, BankSwitcher, MapperLatch, MbcType, NoMbc};
pub use mmu::{Mmu, SegmentFlags};
pub use peripheral_io::PeripheralIo;
pub use ppu::{Ppu, PpuMode};

const WRAM_SIZE: usize = 0x2000;
const BOOT_ROM_SIZE: usize = 256;

/// Owns every backing buffer the MMU's segments point into (boot ROM, WRAM,
/// VRAM, OAM, peripheral I/O) and the four cooperating units (CPU, PPU, DMA,
/// MMU), and drives them in lock-step the way `spec.md`'s host tick loop
/// does: one CPU M-cycle, with the PPU and DMA units each ticked once per
/// T-cycle that M-cycle spans.
///
/// This is the crate's only `unsafe`-free entry point: everything the MMU,
/// PPU and DMA need raw pointers for is bound once here, against buffers
/// this struct owns for its own lifetime.
pub struct System {
    cpu: Cpu,
    mmu: Mmu,
    io: PeripheralIo,
    ppu: Ppu,
    dma: Dma,
    t_cycle_count: u64,
    boot_rom: Box<[u8; BOOT_ROM_SIZE]>,
    wram: Box<[u8; WRAM_SIZE]>,
    vram: Box<[u8; ppu::constants::VRAM_SIZE as usize]>,
    oam: Box<[u8; ppu::constants::OAM_SIZE as usize]>,
    rom: Box<[u8]>,
}

impl System {
    /// `BootCPU` + `MapPeripheralIOMemory` + `BootPPU`, collected into one
    /// constructor: maps boot ROM (redirected over cartridge ROM at
    /// `0x0000` until disabled), cartridge ROM, WRAM (+ its echo), VRAM,
    /// OAM and the peripheral I/O block, then binds the PPU to VRAM/OAM and
    /// the CPU's register file to its post-reset state.
    ///
    /// `cartridge_rom` must be at least 32 KiB; only the `NoMbc` fixed-bank
    /// mapping is wired here (see `mbc.rs` for bank-switched carts).
    pub fn new(boot_rom: [u8; BOOT_ROM_SIZE], cartridge_rom: Vec<u8>, pixel_write: Box<dyn FnMut(u8)>) -> Self {
        assert!(cartridge_rom.len() >= 0x8000, "cartridge ROM must be at least 32 KiB");

        let mut boot_rom = Box::new(boot_rom);
        let mut wram = Box::new([0u8; WRAM_SIZE]);
        let mut vram = Box::new([0u8; ppu::constants::VRAM_SIZE as usize]);
        let mut oam = Box::new([0u8; ppu::constants::OAM_SIZE as usize]);
        let mut rom = cartridge_rom.into_boxed_slice();
        let mut io = PeripheralIo::new();
        let mut mmu = Mmu::new();

        // SAFETY: every pointer mapped below comes from a box this `System`
        // keeps alive for its own lifetime, and each is mapped exactly once
        // at a size matching its backing allocation.
        unsafe {
            mbc::map_rom_only(&mut mmu, &mut rom);
            mmu.redirect_zero(boot_rom.as_mut_ptr());
            mmu.map(0xC000, WRAM_SIZE as u32, wram.as_mut_ptr(), SegmentFlags::empty());
            mmu.map(0xE000, 0x1E00, wram.as_mut_ptr(), SegmentFlags::empty());
            mmu.map(ppu::constants::VRAM_START, ppu::constants::VRAM_SIZE, vram.as_mut_ptr(), SegmentFlags::empty());
            mmu.map(ppu::constants::OAM_START, ppu::constants::OAM_SIZE, oam.as_mut_ptr(), SegmentFlags::empty());
            mmu.map(0xFF00, 256, io.as_mut_ptr(), SegmentFlags::empty());
        }

        // SAFETY: `vram`/`oam` are boxes this `System` owns for its whole
        // lifetime; the `Ppu` never outlives them.
        let ppu = unsafe { Ppu::new(vram.as_mut_ptr(), oam.as_mut_ptr(), pixel_write) };

        System {
            cpu: Cpu::new(),
            mmu,
            io,
            ppu,
            dma: Dma::new(),
            t_cycle_count: 0,
            boot_rom,
            wram,
            vram,
            oam,
            rom,
        }
    }

    /// Boot-ROM-skipping constructor: canonical post-boot register state,
    /// no boot ROM overlay installed.
    pub fn new_post_boot(cartridge_rom: Vec<u8>, pixel_write: Box<dyn FnMut(u8)>) -> Self {
        let mut system = Self::new([0u8; BOOT_ROM_SIZE], cartridge_rom, pixel_write);
        system.mmu.remove_zero_redirect();
        system.cpu = Cpu::new_post_boot();
        system
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }
    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }
    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }
    pub fn io(&self) -> &PeripheralIo {
        &self.io
    }

    /// Writes a byte straight onto the bus, bypassing the CPU — used by a
    /// host driver to deliver joypad state into JOYP.
    pub fn poke(&mut self, address: u16, value: u8) {
        self.mmu.write(address, value);
    }

    /// `TickCPU(&cpu, &mmu, 1)` plus the PPU/DMA fan-out: advances the
    /// system by one T-cycle. The CPU itself only retires a new M-cycle
    /// every 4th call (`Cpu::step` spans a whole M-cycle internally and
    /// times its own timer ticks), so this drives the CPU once every 4
    /// calls and the PPU/DMA on every call, matching `spec.md` §2's "PPU is
    /// ticked in lock-step" data-flow description.
    pub fn tick_t_cycle(&mut self) -> CoreResult<()> {
        self.ppu.tick(&mut self.mmu, &mut self.io);
        self.dma.tick(&mut self.mmu, &mut self.io);
        self.t_cycle_count += 1;
        if self.t_cycle_count % 4 == 0 {
            self.cpu.step(&mut self.mmu, &mut self.io)?;
        }
        Ok(())
    }
}
