//! Host-to-keyboard command channel.
//!
//! Commands are queued into a small ring and fed to the keyboard one byte at a
//! time. The keyboard answers every byte with [`CMD_ACK`], which releases the
//! next one, or with [`CMD_RESEND`] when it wants the byte again.

use std::{fmt, sync::mpsc};

use tracing::{trace, warn};

/// Set the scroll/num/caps indicators, followed by one parameter byte
pub const CMD_SET_LED: u8 = 0xED;
/// Keyboard acknowledged the last byte
pub const CMD_ACK: u8 = 0xFA;
/// Keyboard asks for the last byte again
pub const CMD_RESEND: u8 = 0xFE;

pub const CMD_BUFFER_SIZE: usize = 16;

/// Sink for bytes headed to the keyboard.
pub trait Ps2Port {
    fn transmit(&mut self, byte: u8);
}

impl Ps2Port for Vec<u8> {
    fn transmit(&mut self, byte: u8) {
        self.push(byte);
    }
}

impl Ps2Port for mpsc::Sender<u8> {
    fn transmit(&mut self, byte: u8) {
        _ = self.send(byte);
    }
}

impl<P: Ps2Port + ?Sized> Ps2Port for &mut P {
    fn transmit(&mut self, byte: u8) {
        (**self).transmit(byte);
    }
}

/// How the queue treats overflow and resend requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueueMode {
    /// Matches deployed keyboards: no overflow check, and a resend request
    /// replays the slot under the write cursor.
    #[default]
    Compatible,
    /// Rejects commands that do not fit, and replays the byte under the read
    /// cursor on a resend request.
    Hardened,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The command would not fit in the remaining ring space
    Full { pending: usize, requested: usize },
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Full { pending, requested } => write!(
                f,
                "command queue full: {pending} byte(s) pending, {requested} more requested, capacity {CMD_BUFFER_SIZE}"
            ),
        }
    }
}

impl std::error::Error for QueueError {}

/// Fixed ring of outbound bytes with free-running 8-bit cursors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandQueue {
    buffer: [u8; CMD_BUFFER_SIZE],
    write_head: u8,
    read_head: u8,
    mode: QueueMode,
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new(QueueMode::default())
    }
}

fn slot(head: u8) -> usize {
    head as usize % CMD_BUFFER_SIZE
}

impl CommandQueue {
    pub fn new(mode: QueueMode) -> Self {
        Self {
            buffer: [0; CMD_BUFFER_SIZE],
            write_head: 0,
            read_head: 0,
            mode,
        }
    }

    pub fn mode(&self) -> QueueMode {
        self.mode
    }

    /// Number of bytes not yet acknowledged.
    pub fn len(&self) -> usize {
        self.write_head.wrapping_sub(self.read_head) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.read_head == self.write_head
    }

    /// Returns `(read, write)`.
    pub fn cursors(&self) -> (u8, u8) {
        (self.read_head, self.write_head)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    fn push(&mut self, byte: u8) {
        self.buffer[slot(self.write_head)] = byte;
        self.write_head = self.write_head.wrapping_add(1);
    }

    /// Queues a command and (re)transmits the oldest unacknowledged byte.
    ///
    /// The transmit happens even when a byte is already in flight, so the
    /// keyboard may see the head of the queue twice.
    pub fn enqueue(
        &mut self,
        port: &mut impl Ps2Port,
        command: u8,
        data: Option<u8>,
    ) -> Result<(), QueueError> {
        let requested = 1 + data.is_some() as usize;
        if self.mode == QueueMode::Hardened && self.len() + requested > CMD_BUFFER_SIZE {
            let error = QueueError::Full {
                pending: self.len(),
                requested,
            };
            warn!("CMD: dropping {command:02X} {data:02X?}: {error}");
            return Err(error);
        }

        self.push(command);
        if let Some(data) = data {
            self.push(data);
        }
        trace!(
            "CMD: queued {command:02X} {data:02X?}, cursors {:?}",
            self.cursors()
        );

        port.transmit(self.buffer[slot(self.read_head)]);
        Ok(())
    }

    /// Retires the byte under the read cursor and sends the next one, if any.
    ///
    /// An acknowledgment with nothing outstanding only resets the cursors.
    pub fn acknowledge(&mut self, port: &mut impl Ps2Port) {
        if !self.is_empty() {
            self.read_head = self.read_head.wrapping_add(1);
        }

        if self.read_head != self.write_head {
            let byte = self.buffer[slot(self.read_head)];
            trace!("CMD: ack, sending {byte:02X}");
            port.transmit(byte);
        } else {
            trace!("CMD: ack, queue drained");
            self.read_head = 0;
            self.write_head = 0;
        }
    }

    /// Answers a resend request from the keyboard.
    pub fn resend(&mut self, port: &mut impl Ps2Port) {
        let head = match self.mode {
            QueueMode::Compatible => self.write_head,
            QueueMode::Hardened => {
                if self.is_empty() {
                    trace!("CMD: resend with nothing outstanding");
                    return;
                }
                self.read_head
            }
        };
        let byte = self.buffer[slot(head)];
        trace!("CMD: resend {byte:02X} from slot {}", slot(head));
        port.transmit(byte);
    }
}
