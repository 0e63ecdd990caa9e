use tracing::debug;

use super::flags::{Flags, Lock, Modifier};

/// Per-lock toggle latch.
///
/// A lock turns on at the make code of the enabling press and turns off at
/// the break code of the disabling press. The latch remembers which half of
/// that cycle the key is in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Latch {
    #[default]
    Idle,
    Armed,
}

/// Outcome of advancing a lock latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockToggle {
    pub latch: Latch,
    /// Whether the lock's bit in the flag vector changed
    pub changed: bool,
}

/// Everything the decoder remembers between bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyboardState {
    pub flags: Flags,
    /// The previous byte was [`BREAK_PREFIX`](super::scancode::BREAK_PREFIX)
    pub pending_break: bool,
    /// The previous byte was [`ESCAPE_PREFIX`](super::scancode::ESCAPE_PREFIX)
    pub pending_escape: bool,
    scroll_lock: Latch,
    num_lock: Latch,
    caps_lock: Latch,
}

impl KeyboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn clear_prefixes(&mut self) {
        self.pending_break = false;
        self.pending_escape = false;
    }

    pub fn set_modifier(&mut self, modifier: Modifier, pressed: bool) {
        self.flags.set(modifier.bit(), pressed);
    }

    pub fn latch(&self, lock: Lock) -> Latch {
        match lock {
            Lock::Scroll => self.scroll_lock,
            Lock::Num => self.num_lock,
            Lock::Caps => self.caps_lock,
        }
    }

    fn latch_mut(&mut self, lock: Lock) -> &mut Latch {
        match lock {
            Lock::Scroll => &mut self.scroll_lock,
            Lock::Num => &mut self.num_lock,
            Lock::Caps => &mut self.caps_lock,
        }
    }

    /// Advances the latch for `lock` using the current break prefix, then
    /// clears both prefixes.
    ///
    /// | latch | byte    | effect                          |
    /// |-------|---------|---------------------------------|
    /// | Idle  | make    | flag on, stay Idle              |
    /// | Idle  | break   | Armed                           |
    /// | Armed | make    | nothing (held or re-pressed)    |
    /// | Armed | break   | flag off, back to Idle          |
    pub fn toggle_lock(&mut self, lock: Lock) -> LockToggle {
        let released = self.pending_break;
        let before = self.flags.get(lock.bit());

        let latch = match (self.latch(lock), released) {
            (Latch::Idle, false) => {
                self.flags.set(lock.bit(), true);
                Latch::Idle
            }
            (Latch::Idle, true) => Latch::Armed,
            (Latch::Armed, false) => Latch::Armed,
            (Latch::Armed, true) => {
                self.flags.set(lock.bit(), false);
                Latch::Idle
            }
        };
        *self.latch_mut(lock) = latch;
        self.clear_prefixes();

        let changed = before != self.flags.get(lock.bit());
        debug!(
            "KBD: {lock:?} lock {} -> {latch:?}, {:?}",
            if released { "break" } else { "make" },
            self.flags
        );
        LockToggle { latch, changed }
    }
}
