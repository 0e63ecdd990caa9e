use tracing::debug;

use crate::keyboard::command::Ps2Port;

/// Stands in for the transmit register: logs and keeps every byte the host
/// sends to the keyboard.
#[derive(Debug, Default)]
pub struct RecordingPort {
    sent: Vec<u8>,
}

impl RecordingPort {
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.sent)
    }
}

impl Ps2Port for RecordingPort {
    fn transmit(&mut self, byte: u8) {
        debug!("PS2: TX {byte:02X}");
        self.sent.push(byte);
    }
}
