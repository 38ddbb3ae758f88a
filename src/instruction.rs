/// A fully decoded CHIP-8 instruction. Decoding up front into one variant
/// per operation means execution is a single exhaustive match: there is no
/// unreachable-default arm to hide a typo in, and every family can be
/// tested in isolation.
///
/// Word fields, per the usual convention: X = bits 11-8, Y = bits 7-4,
/// N = bits 3-0, NN = low byte, NNN = low 12 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    ClearScreen,
    /// 00EE
    Return,
    /// 1NNN
    Jump { addr: u16 },
    /// 2NNN
    Call { addr: u16 },
    /// 3XNN
    SkipEqImm { x: usize, nn: u8 },
    /// 4XNN
    SkipNeImm { x: usize, nn: u8 },
    /// 5XY0
    SkipEqReg { x: usize, y: usize },
    /// 9XY0
    SkipNeReg { x: usize, y: usize },
    /// 6XNN
    SetImm { x: usize, nn: u8 },
    /// 7XNN, no carry flag
    AddImm { x: usize, nn: u8 },
    /// 8XY0
    Move { x: usize, y: usize },
    /// 8XY1
    Or { x: usize, y: usize },
    /// 8XY2
    And { x: usize, y: usize },
    /// 8XY3
    Xor { x: usize, y: usize },
    /// 8XY4, VF = carry
    Add { x: usize, y: usize },
    /// 8XY5, VF = no-borrow
    Sub { x: usize, y: usize },
    /// 8XY6, VF = bit shifted out
    ShiftRight { x: usize },
    /// 8XY7, VX = VY - VX, VF = no-borrow
    SubFrom { x: usize, y: usize },
    /// 8XYE, VF = bit shifted out
    ShiftLeft { x: usize },
    /// ANNN
    SetIndex { addr: u16 },
    /// BNNN, jumps to NNN + V0
    JumpOffset { addr: u16 },
    /// CXNN, VX = random byte AND NN
    Random { x: usize, nn: u8 },
    /// DXYN
    Draw { x: usize, y: usize, n: u8 },
    /// EX9E
    SkipKeyPressed { x: usize },
    /// EXA1
    SkipKeyNotPressed { x: usize },
    /// FX07
    ReadDelay { x: usize },
    /// FX15
    SetDelay { x: usize },
    /// FX18
    SetSound { x: usize },
    /// FX1E, VF = 1 on 16-bit overflow
    AddIndex { x: usize },
    /// FX0A, blocks until a key press
    WaitKey { x: usize },
    /// FX29
    FontGlyph { x: usize },
    /// FX33
    StoreBcd { x: usize },
    /// FX55
    StoreRegisters { x: usize },
    /// FX65
    LoadRegisters { x: usize },
}

impl Instruction {
    /// Decode one 16-bit word. None means no such instruction — including
    /// the 0NNN machine-call family, which this interpreter does not
    /// support; the caller treats that as fatal.
    pub fn decode(word: u16) -> Option<Instruction> {
        use Instruction::*;

        let x = ((word >> 8) & 0x0f) as usize;
        let y = ((word >> 4) & 0x0f) as usize;
        let n = (word & 0x000f) as u8;
        let nn = (word & 0x00ff) as u8;
        let addr = word & 0x0fff;

        Some(match word >> 12 {
            0x0 => match word {
                0x00e0 => ClearScreen,
                0x00ee => Return,
                _ => return None,
            },
            0x1 => Jump { addr },
            0x2 => Call { addr },
            0x3 => SkipEqImm { x, nn },
            0x4 => SkipNeImm { x, nn },
            0x5 => match n {
                0x0 => SkipEqReg { x, y },
                _ => return None,
            },
            0x6 => SetImm { x, nn },
            0x7 => AddImm { x, nn },
            0x8 => match n {
                0x0 => Move { x, y },
                0x1 => Or { x, y },
                0x2 => And { x, y },
                0x3 => Xor { x, y },
                0x4 => Add { x, y },
                0x5 => Sub { x, y },
                0x6 => ShiftRight { x },
                0x7 => SubFrom { x, y },
                0xe => ShiftLeft { x },
                _ => return None,
            },
            0x9 => match n {
                0x0 => SkipNeReg { x, y },
                _ => return None,
            },
            0xa => SetIndex { addr },
            0xb => JumpOffset { addr },
            0xc => Random { x, nn },
            0xd => Draw { x, y, n },
            0xe => match nn {
                0x9e => SkipKeyPressed { x },
                0xa1 => SkipKeyNotPressed { x },
                _ => return None,
            },
            0xf => match nn {
                0x07 => ReadDelay { x },
                0x0a => WaitKey { x },
                0x15 => SetDelay { x },
                0x18 => SetSound { x },
                0x1e => AddIndex { x },
                0x29 => FontGlyph { x },
                0x33 => StoreBcd { x },
                0x55 => StoreRegisters { x },
                0x65 => LoadRegisters { x },
                _ => return None,
            },
            _ => unreachable!("top nibble is 4 bits"),
        })
    }
}
