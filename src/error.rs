use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can abort emulation. CHIP-8 programs are expected to be
/// well-formed, so none of these are recoverable: each one means either a
/// malformed program, a missing resource, or a bug in the caller. They are
/// reported to the operator and the process terminates.
#[derive(Debug, Error)]
pub enum Chip8Error {
    /// memory access outside the 4096-byte address space
    #[error("memory address {addr:#05x} out of range")]
    OutOfRange { addr: usize },

    /// 00EE with nothing on the call stack; the program is malformed
    #[error("return with an empty call stack")]
    StackUnderflow,

    /// 2NNN nested deeper than the configured stack capacity
    #[error("call stack exceeded {limit} entries")]
    StackOverflow { limit: usize },

    /// no decode match for the fetched word
    #[error("unknown opcode {word:#06x} at {addr:#05x}")]
    UnknownOpcode { word: u16, addr: u16 },

    /// program file missing or unreadable at startup
    #[error("can't load program from {path:?}: {source}")]
    ResourceInit { path: PathBuf, source: io::Error },

    /// terminal/display i/o failure (also carries the Esc quit signal as
    /// io::ErrorKind::Interrupted)
    #[error(transparent)]
    Io(#[from] io::Error),
}
