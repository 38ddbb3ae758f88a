use beep::beep;
use std::io;

/// Tone generation for the sound timer. The interpreter core only exposes
/// the timer's value; the main loop drives one of these from it, calling
/// `on` every frame the value is nonzero and `off` otherwise, so both must
/// be cheap to call repeatedly.
pub trait Sound {
    fn on(&mut self) -> Result<(), io::Error>;
    fn off(&mut self) -> Result<(), io::Error>;
}

const SIMPLEBEEP_PITCH: u16 = 2093; // C

/// square wave out of the PC speaker
pub struct SimpleBeep {
    is_beeping: bool,
}

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep { is_beeping: false }
    }
}

impl Default for SimpleBeep {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for SimpleBeep {
    fn on(&mut self) -> Result<(), io::Error> {
        if !self.is_beeping {
            beep(SIMPLEBEEP_PITCH).map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            self.is_beeping = true;
        }
        Ok(())
    }

    fn off(&mut self) -> Result<(), io::Error> {
        if self.is_beeping {
            beep(0).map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
            self.is_beeping = false;
        }
        Ok(())
    }
}

/// no-op Sound, for tests and machines without a beeper
pub struct Mute;

impl Mute {
    pub fn new() -> Self {
        Mute
    }
}

impl Default for Mute {
    fn default() -> Self {
        Self::new()
    }
}

impl Sound for Mute {
    fn on(&mut self) -> Result<(), io::Error> {
        Ok(())
    }

    fn off(&mut self) -> Result<(), io::Error> {
        Ok(())
    }
}
