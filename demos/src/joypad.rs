//! Keyboard-to-JOYP bridge: tracks pressed buttons and folds them into the
//! P1 register's readback nibble on demand. Grounded on the teacher's
//! `joypad.rs::Joypad`, adapted to poll-and-poke `boba::System` instead of
//! owning the register byte directly.

use sdl2::keyboard::Keycode;

#[derive(Clone, Debug, Default)]
pub struct Joypad {
    right: bool,
    left: bool,
    up: bool,
    down: bool,
    a: bool,
    b: bool,
    select: bool,
    start: bool,
}

impl Joypad {
    pub fn new() -> Self {
        Joypad::default()
    }

    pub fn key_down(&mut self, key: Keycode) {
        self.set(key, true);
    }

    pub fn key_up(&mut self, key: Keycode) {
        self.set(key, false);
    }

    fn set(&mut self, key: Keycode, pressed: bool) {
        match key {
            Keycode::Right | Keycode::D => self.right = pressed,
            Keycode::Left | Keycode::A => self.left = pressed,
            Keycode::Up | Keycode::W => self.up = pressed,
            Keycode::Down | Keycode::S => self.down = pressed,
            Keycode::Z | Keycode::J => self.a = pressed,
            Keycode::X | Keycode::K => self.b = pressed,
            Keycode::Backspace | Keycode::RShift => self.select = pressed,
            Keycode::Return | Keycode::Space => self.start = pressed,
            _ => {}
        }
    }

    /// Recomputes JOYP's lower nibble from whichever button group the game
    /// currently has selected (bits 4/5 of the register it last wrote) and
    /// pokes the result back onto the bus.
    pub fn sync(&self, system: &mut boba::System) {
        let selection = system.io().raw(boba::peripheral_io::JOYP) & 0x30;
        let mut value = 0x0Fu8;
        if selection & 0x20 == 0 {
            if self.a { value &= 0b1110; }
            if self.b { value &= 0b1101; }
            if self.select { value &= 0b1011; }
            if self.start { value &= 0b0111; }
        }
        if selection & 0x10 == 0 {
            if self.right { value &= 0b1110; }
            if self.left { value &= 0b1101; }
            if self.up { value &= 0b1011; }
            if self.down { value &= 0b0111; }
        }
        system.poke(0xFF00, value | selection | 0xC0);
    }
}
