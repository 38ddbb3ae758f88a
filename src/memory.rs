use crate::error::Chip8Error;
use std::io;
use std::io::Read;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where programs are loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// where the font glyphs live (16 characters x 5 bytes, 0x000-0x04f)
pub const CHIP8_FONT_ADDR: u16 = 0x0000;

/// bytes per font glyph
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// The CHIP-8 address space: 4096 bytes, font glyphs baked in at the bottom
/// at construction, program image at 0x200 upward. Also owns the program
/// counter; only the interpreter (and the jump/call/return/skip
/// instructions it executes) moves it.
pub struct Chip8Memory {
    bytes: Box<[u8]>,
    pc: u16,
}

impl Chip8Memory {
    pub fn new() -> Self {
        let mut m = Chip8Memory {
            bytes: Box::new([0u8; CHIP8_RAM_SIZE_BYTES]),
            pc: CHIP8_PROGRAM_ADDR,
        };
        let base = CHIP8_FONT_ADDR as usize;
        m.bytes[base..base + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        m
    }

    /// read one byte; addresses at or beyond 4096 are an error, never a wrap
    pub fn get_byte(&self, addr: u16) -> Result<u8, Chip8Error> {
        self.bytes
            .get(addr as usize)
            .copied()
            .ok_or(Chip8Error::OutOfRange { addr: addr as usize })
    }

    /// write one byte, same bounds policy as get_byte
    pub fn set_byte(&mut self, addr: u16, value: u8) -> Result<(), Chip8Error> {
        match self.bytes.get_mut(addr as usize) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Chip8Error::OutOfRange { addr: addr as usize }),
        }
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// load a CHIP-8 program image at 0x200; fails if it doesn't fit in the
    /// remaining address space
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<(), Chip8Error> {
        let mut image = Vec::new();
        reader.read_to_end(&mut image).map_err(Chip8Error::Io)?;
        let start = CHIP8_PROGRAM_ADDR as usize;
        if start + image.len() > CHIP8_RAM_SIZE_BYTES {
            return Err(Chip8Error::OutOfRange {
                addr: start + image.len() - 1,
            });
        }
        self.bytes[start..start + image.len()].copy_from_slice(&image);
        log::debug!("loaded {} byte program at {:#05x}", image.len(), start);
        Ok(())
    }
}

impl Default for Chip8Memory {
    fn default() -> Self {
        Self::new()
    }
}
