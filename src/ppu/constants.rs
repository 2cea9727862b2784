//! Screen dimensions, OAM scan limits, and scanline timing constants.
//! Grounded on `PPU.hpp`'s `SCREEN_WIDTH`/`SCREEN_HEIGHT`/
//! `MAX_OAM_ENTRIES_PER_SCANLINE` plus the teacher's VRAM debug tile grid.

pub const GB_WIDTH: usize = 160;
pub const GB_HEIGHT: usize = 144;
pub const FRAME_BUFFER_SIZE: usize = GB_WIDTH * GB_HEIGHT;

pub const TILES_PER_ROW_DEBUG: usize = 16;
pub const NUM_TILES_TO_SHOW: usize = 384;
const VRAM_DEBUG_TILE_HEIGHT: usize = NUM_TILES_TO_SHOW / TILES_PER_ROW_DEBUG;
pub const VRAM_DEBUG_WIDTH: usize = TILES_PER_ROW_DEBUG * 8;
pub const VRAM_DEBUG_HEIGHT: usize = VRAM_DEBUG_TILE_HEIGHT * 8;
pub const VRAM_DEBUG_BUFFER_SIZE: usize = VRAM_DEBUG_WIDTH * VRAM_DEBUG_HEIGHT;

pub const OBJECT_FETCH_DOTS: u16 = 80;
pub const DOTS_PER_SCANLINE: u16 = 456;
pub const SCANLINES_PER_FRAME: u8 = 154;

pub const MAX_OAM_ENTRIES_PER_SCANLINE: usize = 10;
pub const OAM_ENTRY_COUNT: usize = 40;
pub const OAM_ENTRY_SIZE: u16 = 4;

pub const VRAM_SIZE: u32 = 0x2000;
pub const OAM_SIZE: u32 = 0x100;
pub const VRAM_START: u16 = 0x8000;
pub const OAM_START: u16 = 0xFE00;
