//! SDL2 front end for the `boba` core: loads a ROM (and optional boot ROM),
//! drives [`boba::System`] in real time, and presents its pixel callback
//! output in a window. Grounded on the teacher's `app/main.rs` event loop,
//! trimmed of its disassembly/VRAM debug panes (see DESIGN.md) since this
//! demo exists to exercise the core's public API, not to reproduce the
//! teacher's full debugger UI.

mod joypad;

use boba::ppu::constants::{DOTS_PER_SCANLINE, GB_HEIGHT, GB_WIDTH, SCANLINES_PER_FRAME};
use joypad::Joypad;
use sdl2::event::Event;
use sdl2::pixels::Color;
use sdl2::rect::Rect;
use std::cell::RefCell;
use std::env;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

const SCALE: u32 = 3;
const PALETTE: [Color; 4] = [
    Color::RGB(0x9B, 0xBC, 0x0F),
    Color::RGB(0x8B, 0xAC, 0x0F),
    Color::RGB(0x30, 0x62, 0x30),
    Color::RGB(0x0F, 0x38, 0x0F),
];
const DOTS_PER_FRAME: u64 = DOTS_PER_SCANLINE as u64 * SCANLINES_PER_FRAME as u64;
const TARGET_FRAME_DURATION: Duration = Duration::from_nanos(1_000_000_000 / 60);

fn main() -> Result<(), String> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <rom-path> [boot-rom-path]", args[0]);
        std::process::exit(1);
    }
    let rom_path = Path::new(&args[1]);
    let cartridge = fs::read(rom_path).map_err(|e| format!("failed to read ROM '{}': {e}", rom_path.display()))?;

    let frame_buffer = Rc::new(RefCell::new(vec![0u8; GB_WIDTH * GB_HEIGHT]));
    let pixel_index = Rc::new(RefCell::new(0usize));
    let sink = frame_buffer.clone();
    let index = pixel_index.clone();
    let pixel_write: Box<dyn FnMut(u8)> = Box::new(move |shade| {
        let mut i = index.borrow_mut();
        if *i < sink.borrow().len() {
            sink.borrow_mut()[*i] = shade;
            *i += 1;
        }
    });

    let mut system = match args.get(2) {
        Some(boot_rom_path) => {
            let bytes = fs::read(boot_rom_path).map_err(|e| format!("failed to read boot ROM: {e}"))?;
            let mut boot_rom = [0u8; 256];
            let len = bytes.len().min(256);
            boot_rom[..len].copy_from_slice(&bytes[..len]);
            boba::System::new(boot_rom, cartridge, pixel_write)
        }
        None => boba::System::new_post_boot(cartridge, pixel_write),
    };

    let sdl = sdl2::init()?;
    let video = sdl.video()?;
    let window = video
        .window("boba", GB_WIDTH as u32 * SCALE, GB_HEIGHT as u32 * SCALE)
        .position_centered()
        .build()
        .map_err(|e| e.to_string())?;
    let mut canvas = window.into_canvas().accelerated().present_vsync().build().map_err(|e| e.to_string())?;
    let mut event_pump = sdl.event_pump()?;

    let mut pad = Joypad::new();

    'main_loop: loop {
        let frame_start = Instant::now();

        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'main_loop,
                Event::KeyDown { keycode: Some(k), .. } => pad.key_down(k),
                Event::KeyUp { keycode: Some(k), .. } => pad.key_up(k),
                _ => {}
            }
        }
        pad.sync(&mut system);

        *pixel_index.borrow_mut() = 0;
        for _ in 0..DOTS_PER_FRAME {
            if let Err(e) = system.tick_t_cycle() {
                log::error!("core halted: {e}");
                break 'main_loop;
            }
        }

        canvas.set_draw_color(Color::RGB(0, 0, 0));
        canvas.clear();
        {
            let buffer = frame_buffer.borrow();
            for y in 0..GB_HEIGHT {
                for x in 0..GB_WIDTH {
                    let shade = buffer[y * GB_WIDTH + x] as usize & 0x03;
                    canvas.set_draw_color(PALETTE[shade]);
                    let rect = Rect::new((x as u32 * SCALE) as i32, (y as u32 * SCALE) as i32, SCALE, SCALE);
                    canvas.fill_rect(rect).ok();
                }
            }
        }
        canvas.present();

        let elapsed = frame_start.elapsed();
        if elapsed < TARGET_FRAME_DURATION {
            thread::sleep(TARGET_FRAME_DURATION - elapsed);
        }
    }

    Ok(())
}
