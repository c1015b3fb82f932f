//! System time as a count of PIT ticks.

use core::sync::atomic::{AtomicUsize, Ordering};

use crate::config::PIT_DEFAULT_HZ;
use crate::interrupts::sink::TimerSink;
use crate::interrupts::trap::TrapFrame;

/// Counts timer interrupts since boot. This is the kernel's only source of
/// time at this stage.
static TICKS: AtomicUsize = AtomicUsize::new(0);

/// Opaquely represents a point in system time.
#[derive(Copy, Clone, Eq, Ord, PartialEq, PartialOrd)]
pub struct SysTime(usize);

impl SysTime {
    /// The current tick count.
    pub fn now() -> Self {
        SysTime(TICKS.load(Ordering::Relaxed))
    }

    /// The time `secs` seconds after `self`, assuming the PIT is running
    /// at [`PIT_DEFAULT_HZ`].
    pub fn after(&self, secs: usize) -> Self {
        SysTime(self.0 + secs * PIT_DEFAULT_HZ as usize)
    }
}

/// Tick the clock. Only the timer sink below should call this.
fn tick() {
    TICKS.fetch_add(1, Ordering::Relaxed);
}

/// The default timer sink wired up by `kernel_main`: every IRQ0 just
/// advances the tick counter.
pub struct TickingClock;

impl TimerSink for TickingClock {
    fn on_tick(&mut self, _frame: &TrapFrame) {
        tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticking_advances_now() {
        let before = SysTime::now();
        let mut clock = TickingClock;
        clock.on_tick(&crate::interrupts::trap::TrapFrame {
            gs: 0,
            fs: 0,
            es: 0,
            ds: 0,
            edi: 0,
            esi: 0,
            ebp: 0,
            esp: 0,
            ebx: 0,
            edx: 0,
            ecx: 0,
            eax: 0,
            int_no: 32,
            err_code: 0,
            eip: 0,
            cs: 0,
            eflags: 0,
            useresp: 0,
            ss: 0,
        });
        assert!(SysTime::now() > before);
    }

    #[test]
    fn after_adds_hz_scaled_seconds() {
        let t = SysTime(0);
        let later = t.after(2);
        assert_eq!(later.0, 2 * PIT_DEFAULT_HZ as usize);
    }
}
