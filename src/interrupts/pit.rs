//! Programs the programmable interval timer's channel 0 for a fixed
//! tick rate.

use crate::config::PIT_BASE_HZ;
use crate::machine::PortIo;

const COMMAND_PORT: u16 = 0x43;
const CHANNEL_0_DATA_PORT: u16 = 0x40;

/// Channel 0, lobyte/hibyte access, mode 3 (square wave).
const MODE_3_SQUARE_WAVE: u8 = 0x36;

/// Program channel 0 to fire at `hz`, mode 3.
///
/// # Panics
/// If `hz` is so low that `PIT_BASE_HZ / hz` would not fit the PIT's
/// 16-bit reload register.
pub fn init(io: &mut impl PortIo, hz: u32) {
    let divisor = PIT_BASE_HZ / hz;
    assert!(divisor <= 0xFFFF, "PIT divisor {} doesn't fit in 16 bits", divisor);

    unsafe {
        io.outb(COMMAND_PORT, MODE_3_SQUARE_WAVE);
        io.outb(CHANNEL_0_DATA_PORT, (divisor & 0xFF) as u8);
        io.outb(CHANNEL_0_DATA_PORT, (divisor >> 8) as u8);
    }

    log::info!("PIT inited - {} hz", hz);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingPorts {
        writes: Vec<(u16, u8)>,
    }

    impl PortIo for RecordingPorts {
        unsafe fn outb(&mut self, port: u16, value: u8) {
            self.writes.push((port, value));
        }

        unsafe fn inb(&mut self, _port: u16) -> u8 {
            0
        }
    }

    #[test]
    fn init_100hz_writes_expected_divisor() {
        let mut ports = RecordingPorts::default();
        init(&mut ports, 100);

        let divisor = PIT_BASE_HZ / 100;
        assert_eq!(
            ports.writes,
            vec![
                (COMMAND_PORT, MODE_3_SQUARE_WAVE),
                (CHANNEL_0_DATA_PORT, (divisor & 0xFF) as u8),
                (CHANNEL_0_DATA_PORT, (divisor >> 8) as u8),
            ]
        );
    }

    #[test]
    #[should_panic(expected = "doesn't fit in 16 bits")]
    fn init_too_low_hz_panics() {
        let mut ports = RecordingPorts::default();
        init(&mut ports, 1);
    }
}
