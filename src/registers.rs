use crate::error::Chip8Error;

/// V15 doubles as the flag register: carry, no-borrow, shifted-out bit,
/// sprite collision
pub const FLAG: usize = 0xf;

/// original hardware allowed 16 nested subroutine calls
pub const CHIP8_STACK_DEPTH: usize = 16;

/// The 16 general-purpose 8-bit registers V0..VF plus the 16-bit index
/// register. Register indices come from instruction nibbles, so anything
/// outside 0..=15 is a decoder bug; get/set panic rather than clamp.
pub struct RegisterFile {
    v: [u8; 16],
    i: u16,
}

impl RegisterFile {
    pub fn new() -> Self {
        RegisterFile { v: [0; 16], i: 0 }
    }

    pub fn get(&self, reg: usize) -> u8 {
        assert!(reg < 16, "register index {} out of range", reg);
        self.v[reg]
    }

    pub fn set(&mut self, reg: usize, val: u8) {
        assert!(reg < 16, "register index {} out of range", reg);
        self.v[reg] = val;
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn set_index(&mut self, i: u16) {
        self.i = i;
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

/// LIFO of subroutine return addresses. Capacity is configurable; the
/// default matches the original 16-entry hardware limit, and blowing past
/// it is a resource error rather than silent growth.
pub struct CallStack {
    frames: Vec<u16>,
    limit: usize,
}

impl CallStack {
    pub fn new() -> Self {
        Self::with_limit(CHIP8_STACK_DEPTH)
    }

    pub fn with_limit(limit: usize) -> Self {
        CallStack {
            frames: Vec::with_capacity(limit),
            limit,
        }
    }

    pub fn push(&mut self, addr: u16) -> Result<(), Chip8Error> {
        if self.frames.len() >= self.limit {
            return Err(Chip8Error::StackOverflow { limit: self.limit });
        }
        self.frames.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, Chip8Error> {
        self.frames.pop().ok_or(Chip8Error::StackUnderflow)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new()
    }
}
