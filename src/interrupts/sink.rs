//! Collaborator interfaces the trap dispatcher calls into.
//!
//! Implementations (a real keyboard ring buffer, a scheduler tick) live
//! outside this core. Both operations run with interrupts disabled and
//! must not block.

use crate::interrupts::trap::TrapFrame;

/// Receives scancodes read off port 0x60 during IRQ1.
pub trait KeyboardSink {
    fn send_scancode(&mut self, scancode: u8);
}

/// Receives a callback on every timer tick (IRQ0).
pub trait TimerSink {
    fn on_tick(&mut self, frame: &TrapFrame);
}

/// Minimal default keyboard sink, used until a real scancode-to-ascii
/// collaborator is wired up: just logs what it received.
pub struct LoggingKeyboardSink;

impl KeyboardSink for LoggingKeyboardSink {
    fn send_scancode(&mut self, scancode: u8) {
        log::info!("scancode {:#04x}", scancode);
    }
}

/// A sink that does nothing, usable anywhere a `TimerSink`/`KeyboardSink`
/// is required but no collaborator has been wired up yet.
pub struct NullSink;

impl KeyboardSink for NullSink {
    fn send_scancode(&mut self, _scancode: u8) {}
}

impl TimerSink for NullSink {
    fn on_tick(&mut self, _frame: &TrapFrame) {}
}
