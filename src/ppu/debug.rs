//! Renders all 384 VRAM tiles to a flat debug grid. Grounded on the
//! teacher's `ppu/debug.rs::render_vram_debug`, adapted to read directly
//! from the PPU's VRAM pointer instead of through a `MemoryBus`.

use super::constants::*;

/// # Safety
/// `vram` must point to at least `VRAM_SIZE` valid, readable bytes.
pub(super) unsafe fn render_vram_debug(buffer: &mut [u8; VRAM_DEBUG_BUFFER_SIZE], vram: *const u8) {
    for tile_idx in 0..NUM_TILES_TO_SHOW {
        let tile_addr = tile_idx * 16;
        let tile_grid_x = tile_idx % TILES_PER_ROW_DEBUG;
        let tile_grid_y = tile_idx / TILES_PER_ROW_DEBUG;
        let base_pixel_x = tile_grid_x * 8;
        let base_pixel_y = tile_grid_y * 8;

        for y_in_tile in 0..8usize {
            let row_addr = tile_addr + y_in_tile * 2;
            let byte1 = *vram.add(row_addr);
            let byte2 = *vram.add(row_addr + 1);

            for x_in_tile in 0..8u8 {
                let bit_pos = 7 - x_in_tile;
                let bit1 = (byte1 >> bit_pos) & 1;
                let bit2 = (byte2 >> bit_pos) & 1;
                let color_index = (bit2 << 1) | bit1;

                let pixel_x = base_pixel_x + x_in_tile as usize;
                let pixel_y = base_pixel_y + y_in_tile;
                let buffer_index = pixel_y * VRAM_DEBUG_WIDTH + pixel_x;
                if buffer_index < buffer.len() {
                    buffer[buffer_index] = color_index;
                }
            }
        }
    }
}
