//! Decoder for the byte stream of a PS/2 keyboard in scan code set 2, with the
//! host-to-keyboard command queue used to drive the lock LEDs.

pub mod host;
pub mod keyboard;

pub use keyboard::{KeyEvent, Keyboard, KeyboardConfig, LedCadence};
