use std::io;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// both chip-8 timers tick down at 60 Hz regardless of instruction rate
pub const CHIP8_TIMER_HZ: u64 = 60;

/// An 8-bit countdown timer. The counter lives behind an atomic shared with
/// a detached background thread that decrements it at wall-clock 60 Hz,
/// saturating at zero. `value`/`set` from the interpreter thread and the
/// tick from the timer thread can interleave freely without tearing. The
/// thread has no stop; it runs until the process exits.
pub struct Timer {
    value: Arc<AtomicU8>,
}

impl Timer {
    pub fn new() -> Self {
        Timer {
            value: Arc::new(AtomicU8::new(0)),
        }
    }

    /// spawn the 60 Hz decrement loop for this timer
    pub fn start(&self, name: &str) -> Result<(), io::Error> {
        let value = Arc::clone(&self.value);
        let tick = Duration::from_micros(1_000_000 / CHIP8_TIMER_HZ);
        thread::Builder::new().name(name.to_owned()).spawn(move || {
            let sleeper = spin_sleep::SpinSleeper::default();
            loop {
                sleeper.sleep(tick);
                Timer::tick(&value);
            }
        })?;
        Ok(())
    }

    /// one 60 Hz tick: decrement iff nonzero, so the counter parks at zero
    /// instead of wrapping to 255
    fn tick(value: &AtomicU8) {
        // fetch_update so a tick can't clobber a concurrent set()
        let _ = value.fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| {
            if v > 0 {
                Some(v - 1)
            } else {
                None
            }
        });
    }

    pub fn value(&self) -> u8 {
        self.value.load(Ordering::Acquire)
    }

    pub fn set(&self, v: u8) {
        self.value.store(v, Ordering::Release);
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_roundtrip() {
        let t = Timer::new();
        assert_eq!(t.value(), 0);
        t.set(0x3c);
        assert_eq!(t.value(), 0x3c);
    }

    #[test]
    fn test_tick_decrements_to_zero_and_stays() {
        let t = Timer::new();
        t.set(2);
        Timer::tick(&t.value);
        assert_eq!(t.value(), 1);
        Timer::tick(&t.value);
        assert_eq!(t.value(), 0);
        // saturates: never wraps to 255
        Timer::tick(&t.value);
        assert_eq!(t.value(), 0);
    }

    #[test]
    fn test_background_thread_decays_in_real_time() -> Result<(), io::Error> {
        let t = Timer::new();
        t.start("test-timer")?;
        t.set(3);
        // 3 ticks take 50ms at 60 Hz; allow a generous margin
        thread::sleep(Duration::from_millis(250));
        assert_eq!(t.value(), 0);
        Ok(())
    }
}
