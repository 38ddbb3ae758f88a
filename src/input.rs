use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal;
use std::collections::{HashMap, VecDeque};
use std::io;
use std::time::Duration;

/// map from the left-hand side of a qwerty keyboard to the chip-8's 4x4
/// hex pad
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// Reads keypresses for the interpreter. Keys are the chip-8's logical
/// 0x0-0xf identifiers; mapping from a physical device is this layer's
/// problem, not the interpreter's.
pub trait Input {
    /// true if the given key is currently held. Keys outside 0x0-0xf are
    /// never pressed.
    fn is_pressed(&mut self, key: u8) -> Result<bool, io::Error>;

    /// block until a fresh key-press arrives and return it. Each completed
    /// wait consumes its press, so two consecutive waits need two distinct
    /// presses.
    fn wait_key(&mut self) -> Result<u8, io::Error>;

    /// drop stale keypresses; called once per display frame so "pressed"
    /// tracks recent input
    fn flush_keys(&mut self) -> Result<(), io::Error>;
}

/// Input over STDIN via crossterm events. Terminals deliver discrete
/// key-press events and no key-up, so "currently held" means "pressed since
/// the last frame flush". Esc surfaces as an Interrupted error, which the
/// binary treats as quit.
pub struct StdinInput {
    buffer: Vec<u8>,
    keymap: HashMap<char, u8>,
}

impl StdinInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            buffer: Vec::new(),
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
        })
    }

    /// drain whatever events are pending without blocking
    fn read_pending(&mut self) -> Result<(), io::Error> {
        while poll(Duration::from_millis(0))? {
            self.read_one()?;
        }
        Ok(())
    }

    /// handle exactly one event, blocking until it arrives
    fn read_one(&mut self) -> Result<(), io::Error> {
        match read()? {
            Event::Key(evt) => match evt.code {
                KeyCode::Char(key) => match self.keymap.get(&key) {
                    Some(mapped_key) => self.buffer.push(*mapped_key),
                    None => {
                        log::warn!("can't map {:?} to a chip-8 key", key);
                    }
                },
                KeyCode::Esc => {
                    return Err(io::Error::new(io::ErrorKind::Interrupted, "quit requested"));
                }
                _ => {
                    log::warn!("ignoring unmapped key event");
                }
            },
            _ => {
                log::warn!("ignoring non-key event");
            }
        }
        Ok(())
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Input for StdinInput {
    fn is_pressed(&mut self, key: u8) -> Result<bool, io::Error> {
        self.read_pending()?;
        Ok(self.buffer.contains(&key))
    }

    fn wait_key(&mut self) -> Result<u8, io::Error> {
        // the engine's only designed suspension point besides pacing:
        // park on the event stream until a mapped key shows up. stale
        // presses are dropped first so only a fresh press completes the wait
        self.buffer.clear();
        loop {
            self.read_one()?;
            if let Some(key) = self.buffer.pop() {
                return Ok(key);
            }
        }
    }

    fn flush_keys(&mut self) -> Result<(), io::Error> {
        self.read_pending()?;
        self.buffer.clear();
        Ok(())
    }
}

/// scriptable Input implementation for testing: `held` answers is_pressed,
/// `presses` feeds wait_key in order
pub struct DummyInput {
    held: Vec<u8>,
    presses: VecDeque<u8>,
}

impl DummyInput {
    pub fn new(held: &[u8]) -> Self {
        DummyInput {
            held: Vec::from(held),
            presses: VecDeque::new(),
        }
    }

    pub fn with_presses(held: &[u8], presses: &[u8]) -> Self {
        DummyInput {
            held: Vec::from(held),
            presses: presses.iter().copied().collect(),
        }
    }
}

impl Input for DummyInput {
    fn is_pressed(&mut self, key: u8) -> Result<bool, io::Error> {
        Ok(self.held.contains(&key))
    }

    fn wait_key(&mut self) -> Result<u8, io::Error> {
        self.presses
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted keypress"))
    }

    fn flush_keys(&mut self) -> Result<(), io::Error> {
        self.held.clear();
        Ok(())
    }
}
