use std::fmt;

/// Modifier and lock state packed into one byte.
///
/// The bit layout is shared with the keyboard: the low three bits are sent
/// verbatim as the parameter of the set-LED command.
///
/// - Bit 0 (0x01): Scroll lock
/// - Bit 1 (0x02): Num lock
/// - Bit 2 (0x04): Caps lock
/// - Bit 3 (0x08): Shift
/// - Bit 4 (0x10): Ctrl
/// - Bit 5 (0x20): Alt
/// - Bit 6 (0x40): Super
/// - Bit 7 (0x80): ASCII (only set on a decoded event, never persisted)
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flags(u8);

impl Flags {
    pub const SCROLL_LOCK: u8 = 0;
    pub const NUM_LOCK: u8 = 1;
    pub const CAPS_LOCK: u8 = 2;
    pub const SHIFT: u8 = 3;
    pub const CTRL: u8 = 4;
    pub const ALT: u8 = 5;
    pub const SUPER: u8 = 6;
    pub const ASCII: u8 = 7;

    const LED_MASK: u8 = 0x07;

    pub const fn new(byte: u8) -> Self {
        Flags(byte)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn get(self, bit: u8) -> bool {
        self.0 & (1 << bit) != 0
    }

    pub fn set(&mut self, bit: u8, value: bool) {
        self.0 &= !(1 << bit);
        self.0 |= (value as u8) << bit;
    }

    /// The scroll/num/caps bits, as carried by the set-LED command.
    pub const fn leds(self) -> u8 {
        self.0 & Self::LED_MASK
    }

    pub const fn is_scroll_lock(self) -> bool {
        self.get(Self::SCROLL_LOCK)
    }

    pub const fn is_num_lock(self) -> bool {
        self.get(Self::NUM_LOCK)
    }

    pub const fn is_caps_lock(self) -> bool {
        self.get(Self::CAPS_LOCK)
    }

    pub const fn is_shift(self) -> bool {
        self.get(Self::SHIFT)
    }

    pub const fn is_ctrl(self) -> bool {
        self.get(Self::CTRL)
    }

    pub const fn is_alt(self) -> bool {
        self.get(Self::ALT)
    }

    pub const fn is_super(self) -> bool {
        self.get(Self::SUPER)
    }

    pub const fn is_ascii(self) -> bool {
        self.get(Self::ASCII)
    }
}

impl From<u8> for Flags {
    fn from(byte: u8) -> Self {
        Flags(byte)
    }
}

impl From<Flags> for u8 {
    fn from(flags: Flags) -> u8 {
        flags.0
    }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Flags({:02X}=", self.0)?;
        let mut first = true;
        for flag in [
            ("Scroll", self.is_scroll_lock()),
            ("Num", self.is_num_lock()),
            ("Caps", self.is_caps_lock()),
            ("Shift", self.is_shift()),
            ("Ctrl", self.is_ctrl()),
            ("Alt", self.is_alt()),
            ("Super", self.is_super()),
            ("Ascii", self.is_ascii()),
        ] {
            if flag.1 {
                if first {
                    first = false;
                } else {
                    write!(f, "+")?;
                }
                write!(f, "{}", flag.0)?;
            }
        }
        write!(f, ")")?;
        Ok(())
    }
}

/// Momentary modifier keys. Left and right variants share one bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    Shift,
    Ctrl,
    Alt,
    Super,
}

impl Modifier {
    pub const fn bit(self) -> u8 {
        match self {
            Modifier::Shift => Flags::SHIFT,
            Modifier::Ctrl => Flags::CTRL,
            Modifier::Alt => Flags::ALT,
            Modifier::Super => Flags::SUPER,
        }
    }
}

/// Toggled lock keys, each backed by an LED on the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lock {
    Scroll,
    Num,
    Caps,
}

impl Lock {
    pub const fn bit(self) -> u8 {
        match self {
            Lock::Scroll => Flags::SCROLL_LOCK,
            Lock::Num => Flags::NUM_LOCK,
            Lock::Caps => Flags::CAPS_LOCK,
        }
    }
}
