//! Serial console writer and the kernel's `log` backend.
//!
//! Writes format strings straight to COM1 through a hand-rolled `Write`
//! impl, registered as a [`log::Log`] backend so the rest of the crate uses
//! the ordinary `log` facade (`log::info!`, `log::warn!`, `log::error!`)
//! instead of a single ad hoc macro. `printk!` survives as a thin
//! convenience wrapper for call sites that want `write!`-style formatting
//! without importing `log`.
//!
//! Must be safe to call with interrupts disabled: this writer only ever
//! polls the UART's line-status bit and never blocks on a lock that
//! bootstrap code holds across an `sti`.

use core::fmt::{self, Write};

use log::{LevelFilter, Log, Metadata, Record};
use spin::Mutex;

use crate::machine::{PortIo, Ports};

const COM1_DATA: u16 = 0x3F8;
const COM1_LINE_STATUS: u16 = COM1_DATA + 5;
const LINE_STATUS_TRANSMIT_EMPTY: u8 = 0x20;

/// Writes bytes to a serial port, one at a time, waiting for the transmit
/// holding register to empty between each.
pub struct SerialPort<IO: PortIo> {
    io: IO,
}

impl<IO: PortIo> SerialPort<IO> {
    pub const fn new(io: IO) -> Self {
        SerialPort { io }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            unsafe {
                while self.io.inb(COM1_LINE_STATUS) & LINE_STATUS_TRANSMIT_EMPTY == 0 {}
                self.io.outb(COM1_DATA, byte);
            }
        }
    }
}

impl<IO: PortIo> Write for SerialPort<IO> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

static SERIAL: Mutex<SerialPort<Ports>> = Mutex::new(SerialPort::new(Ports::new()));

struct SerialLogger;

impl Log for SerialLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let _ = writeln!(SERIAL.lock(), "[{:<5}] {}", record.level(), record.args());
    }

    fn flush(&self) {}
}

static LOGGER: SerialLogger = SerialLogger;

/// Install the serial-backed logger. Must be called exactly once, early in
/// `kernel_main`, before the first `log::info!`/`printk!` call.
pub fn init() {
    log::set_logger(&LOGGER)
        .map(|()| log::set_max_level(LevelFilter::Trace))
        .expect("logger already initialized");
}

/// Convenience wrapper around `log::info!` kept for call sites that want
/// `write!`-style formatting without importing `log` directly.
#[macro_export]
macro_rules! printk {
    ($($arg:tt)*) => {
        ::log::info!($($arg)*)
    };
}
