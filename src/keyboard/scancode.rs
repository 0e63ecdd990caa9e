//! # Scan code set 2 lookup tables (<https://wiki.osdev.org/PS/2_Keyboard>).
//!
//! Two total functions from a raw byte to an optional [`KeyDescriptor`]: one
//! for plain codes and one for codes following the `0xE0` escape prefix. Codes
//! with no mapping return `None`.

use super::flags::{Lock, Modifier};

/// Prefix announcing that the next code is a key release.
pub const BREAK_PREFIX: u8 = 0xF0;
/// Prefix announcing that the next code belongs to the extended set.
pub const ESCAPE_PREFIX: u8 = 0xE0;

pub const ASCII_ESCAPE: char = '\x1B';
pub const ASCII_BACKSPACE: char = '\x08';
pub const ASCII_TAB: char = '\t';
pub const ASCII_DELETE: char = '\x7F';

/// Keys that do not produce a character on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySymbol {
    Enter,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Home,
    End,
    Insert,
    PageUp,
    PageDown,
    UpArrow,
    DownArrow,
    LeftArrow,
    RightArrow,
    ShiftLeft,
    ShiftRight,
    CtrlLeft,
    CtrlRight,
    AltLeft,
    AltRight,
    SuperLeft,
    SuperRight,
    ScrollLock,
    NumLock,
    CapsLock,
    Menus,
}

impl KeySymbol {
    /// The modifier bit this key drives while held, if any.
    pub const fn modifier(self) -> Option<Modifier> {
        match self {
            KeySymbol::ShiftLeft | KeySymbol::ShiftRight => Some(Modifier::Shift),
            KeySymbol::CtrlLeft | KeySymbol::CtrlRight => Some(Modifier::Ctrl),
            KeySymbol::AltLeft | KeySymbol::AltRight => Some(Modifier::Alt),
            KeySymbol::SuperLeft | KeySymbol::SuperRight => Some(Modifier::Super),
            _ => None,
        }
    }

    /// The lock this key toggles, if any.
    pub const fn lock(self) -> Option<Lock> {
        match self {
            KeySymbol::ScrollLock => Some(Lock::Scroll),
            KeySymbol::NumLock => Some(Lock::Num),
            KeySymbol::CapsLock => Some(Lock::Caps),
            _ => None,
        }
    }
}

/// What a single scan code stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyDescriptor {
    /// A printable (or ASCII control) key with its unshifted and shifted forms
    Ascii { unshifted: char, shifted: char },
    /// A key identified by name
    Symbol(KeySymbol),
}

impl KeyDescriptor {
    pub const fn is_ascii(&self) -> bool {
        matches!(self, KeyDescriptor::Ascii { .. })
    }

    pub const fn symbol(&self) -> Option<KeySymbol> {
        match self {
            KeyDescriptor::Symbol(symbol) => Some(*symbol),
            KeyDescriptor::Ascii { .. } => None,
        }
    }
}

const fn ascii(unshifted: char, shifted: char) -> KeyDescriptor {
    KeyDescriptor::Ascii { unshifted, shifted }
}

const fn symbol(symbol: KeySymbol) -> KeyDescriptor {
    KeyDescriptor::Symbol(symbol)
}

macro_rules! def_scan_codes {
    ($(#[$meta:meta])* $vis:vis fn $name:ident { $($code:literal => $key:expr;)* }) => {
        $(#[$meta])*
        $vis const fn $name(code: u8) -> Option<KeyDescriptor> {
            use KeySymbol::*;
            match code {
                $( $code => Some($key), )*
                _ => None,
            }
        }
    };
}

def_scan_codes! {
    /// Looks up a code received without the escape prefix.
    pub fn base {
        // modifiers
        0x12 => symbol(ShiftLeft);
        0x59 => symbol(ShiftRight);
        0x14 => symbol(CtrlLeft);
        0x11 => symbol(AltLeft);
        0x7E => symbol(ScrollLock);
        0x58 => symbol(CapsLock);
        0x77 => symbol(NumLock);
        // whitespace
        0x76 => ascii(ASCII_ESCAPE, ASCII_ESCAPE);
        0x66 => ascii(ASCII_BACKSPACE, ASCII_BACKSPACE);
        0x0D => ascii(ASCII_TAB, ASCII_TAB);
        0x29 => ascii(' ', ' ');
        0x5A => symbol(Enter);
        // function keys
        0x05 => symbol(F1);
        0x06 => symbol(F2);
        0x04 => symbol(F3);
        0x0C => symbol(F4);
        0x03 => symbol(F5);
        0x0B => symbol(F6);
        0x83 => symbol(F7);
        0x0A => symbol(F8);
        0x01 => symbol(F9);
        0x09 => symbol(F10);
        0x78 => symbol(F11);
        0x07 => symbol(F12);
        // alpha
        0x15 => ascii('q', 'Q');
        0x1D => ascii('w', 'W');
        0x24 => ascii('e', 'E');
        0x2D => ascii('r', 'R');
        0x2C => ascii('t', 'T');
        0x35 => ascii('y', 'Y');
        0x3C => ascii('u', 'U');
        0x43 => ascii('i', 'I');
        0x44 => ascii('o', 'O');
        0x4D => ascii('p', 'P');
        0x1C => ascii('a', 'A');
        0x1B => ascii('s', 'S');
        0x23 => ascii('d', 'D');
        0x2B => ascii('f', 'F');
        0x34 => ascii('g', 'G');
        0x33 => ascii('h', 'H');
        0x3B => ascii('j', 'J');
        0x42 => ascii('k', 'K');
        0x4B => ascii('l', 'L');
        0x1A => ascii('z', 'Z');
        0x22 => ascii('x', 'X');
        0x21 => ascii('c', 'C');
        0x2A => ascii('v', 'V');
        0x32 => ascii('b', 'B');
        0x31 => ascii('n', 'N');
        0x3A => ascii('m', 'M');
        // numeric
        0x16 => ascii('1', '!');
        0x1E => ascii('2', '@');
        0x26 => ascii('3', '#');
        0x25 => ascii('4', '$');
        0x2E => ascii('5', '%');
        0x36 => ascii('6', '^');
        0x3D => ascii('7', '&');
        0x3E => ascii('8', '*');
        0x46 => ascii('9', '(');
        0x45 => ascii('0', ')');
        // symbols
        0x0E => ascii('`', '~');
        0x4E => ascii('-', '_');
        0x55 => ascii('=', '+');
        0x54 => ascii('[', '{');
        0x5B => ascii(']', '}');
        0x4C => ascii(';', ':');
        0x41 => ascii(',', '<');
        0x49 => ascii('.', '>');
        0x4A => ascii('/', '?');
        0x52 => ascii('\'', '"');
        0x5D => ascii('\\', '|');
        // numpad
        0x7C => ascii('*', '*');
        0x7B => ascii('-', '-');
        0x69 => ascii('1', '1');
        0x72 => ascii('2', '2');
        0x7A => ascii('3', '3');
        0x6B => ascii('4', '4');
        0x73 => ascii('5', '5');
        0x74 => ascii('6', '6');
        0x6C => ascii('7', '7');
        0x75 => ascii('8', '8');
        0x7D => ascii('9', '9');
        0x70 => ascii('0', '0');
        0x79 => ascii('+', '+');
        0x71 => ascii('.', '.');
    }
}

def_scan_codes! {
    /// Looks up a code received after [`ESCAPE_PREFIX`]. The extended set only
    /// spans `0x00..=0x7F`.
    pub fn extended {
        0x4A => ascii('/', '/');
        0x71 => ascii(ASCII_DELETE, ASCII_DELETE);
        0x5A => symbol(Enter);
        0x14 => symbol(CtrlRight);
        0x11 => symbol(AltRight);
        0x1F => symbol(SuperLeft);
        0x27 => symbol(SuperRight);
        0x2F => symbol(Menus);
        0x70 => symbol(Insert);
        0x7D => symbol(PageUp);
        0x7A => symbol(PageDown);
        0x6C => symbol(Home);
        0x69 => symbol(End);
        0x75 => symbol(UpArrow);
        0x72 => symbol(DownArrow);
        0x6B => symbol(LeftArrow);
        0x74 => symbol(RightArrow);
    }
}
