//!
//! ## Design
//!
//! * the interpreter core is bit-exact CHIP-8: 4K RAM with the font at
//!   0x000 and programs at 0x200, 16 8-bit registers (VF doubling as the
//!   flag register), a 16-entry call stack, a 64x32 XOR framebuffer with
//!   wraparound, and two 60 Hz countdown timers
//! * instructions are decoded up front into an enum and executed by one
//!   exhaustive match; anything that doesn't decode is fatal, as are
//!   memory/stack violations -- chip-8 programs are expected to be
//!   well-formed and the engine is strict, not resilient
//! * instructions run as fast as possible then sleep to hit a target
//!   instruction rate (700/s by default); the timers decay on their own
//!   detached threads at wall-clock 60 Hz behind atomics, so timer decay
//!   is independent of instruction throughput
//! * display, input and audio sit behind traits so the core doesn't know
//!   how the screen/keyboard/beeper work; the shipped implementations are
//!   a TUI canvas in-console, crossterm key events, and the PC speaker.
//!   dummy implementations of all three keep the tests off the terminal
//! * the engine suspends in exactly two places: the pacing sleep and the
//!   FX0A key-wait; quitting (Esc) surfaces through the input layer as an
//!   Interrupted error
//!
pub mod display;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod registers;
pub mod sound;
pub mod timer;
