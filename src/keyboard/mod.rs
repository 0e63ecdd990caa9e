//! # PS/2 keyboard decoder (scan code set 2).
//!
//! The wire protocol is documented at <https://wiki.osdev.org/PS/2_Keyboard>.
//! A key press arrives as its make code, optionally preceded by the `0xE0`
//! escape prefix. A release is the same code preceded by `0xF0`. The keyboard
//! also sends `0xFA`/`0xFE` in answer to bytes the host transmits, so those are
//! routed to the [`CommandQueue`] rather than decoded.
//!
//! [`Keyboard::decode`] takes `&mut self`, so one decoder can never be entered
//! twice at once. Callers driving it from an interrupt must mask that interrupt
//! around the call and feed bytes in arrival order.

pub mod command;
pub mod flags;
pub mod scancode;
pub mod state;

use tracing::{trace, warn};

use command::{CMD_ACK, CMD_RESEND, CMD_SET_LED, CommandQueue, Ps2Port, QueueMode};
use flags::{Flags, Lock};
use scancode::{BREAK_PREFIX, ESCAPE_PREFIX, KeyDescriptor, KeySymbol};
use state::{KeyboardState, Latch, LockToggle};

/// When the indicator LEDs are rewritten after a lock key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LedCadence {
    /// Whenever a lock latch is idle after the byte, including repeated make
    /// codes of a held lock key.
    #[default]
    ToggleCycle,
    /// Only when a lock bit actually changed.
    EveryChange,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyboardConfig {
    pub queue_mode: QueueMode,
    pub led_cadence: LedCadence,
}

/// A key press the consumer should act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub scan_code: u8,
    /// The code followed the escape prefix
    pub escaped: bool,
    /// `None` for codes with no table entry
    pub key: Option<KeyDescriptor>,
    /// Modifier and lock state at the time of the press
    pub flags: Flags,
}

impl KeyEvent {
    /// The character this press types.
    ///
    /// Caps lock inverts shift for letters only; every other key follows
    /// shift alone.
    pub fn character(&self) -> Option<char> {
        let Some(KeyDescriptor::Ascii { unshifted, shifted }) = self.key else {
            return None;
        };
        let shift = self.flags.is_shift();
        let use_shift = if unshifted.is_ascii_alphabetic() {
            shift != self.flags.is_caps_lock()
        } else {
            shift
        };
        Some(if use_shift { shifted } else { unshifted })
    }

    pub fn symbol(&self) -> Option<KeySymbol> {
        self.key.and_then(|key| key.symbol())
    }
}

pub struct Keyboard<P> {
    state: KeyboardState,
    queue: CommandQueue,
    port: P,
    config: KeyboardConfig,
}

impl<P: Ps2Port> Keyboard<P> {
    pub fn new(port: P) -> Self {
        Self::with_config(port, KeyboardConfig::default())
    }

    pub fn with_config(port: P, config: KeyboardConfig) -> Self {
        Self {
            state: KeyboardState::new(),
            queue: CommandQueue::new(config.queue_mode),
            port,
            config,
        }
    }

    pub fn config(&self) -> KeyboardConfig {
        self.config
    }

    pub fn state(&self) -> &KeyboardState {
        &self.state
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn into_port(self) -> P {
        self.port
    }

    /// Returns to the power-on state. Unacknowledged commands are dropped.
    pub fn reset(&mut self) {
        self.state.reset();
        self.queue.reset();
    }

    /// Consumes one byte from the keyboard.
    pub fn decode(&mut self, scan_code: u8) -> Option<KeyEvent> {
        match scan_code {
            CMD_ACK => {
                self.queue.acknowledge(&mut self.port);
                return None;
            }
            CMD_RESEND => {
                self.queue.resend(&mut self.port);
                return None;
            }
            BREAK_PREFIX => {
                self.state.pending_break = true;
                return None;
            }
            ESCAPE_PREFIX => {
                self.state.pending_escape = true;
                return None;
            }
            _ => {}
        }

        let escaped = self.state.pending_escape;
        let released = self.state.pending_break;
        let key = if escaped {
            scancode::extended(scan_code)
        } else {
            scancode::base(scan_code)
        };
        trace!(
            "KBD: {scan_code:02X} escaped={escaped} released={released} -> {:?}",
            key
        );

        if let Some(KeyDescriptor::Symbol(symbol)) = key {
            if let Some(modifier) = symbol.modifier() {
                self.state.set_modifier(modifier, !released);
                self.state.clear_prefixes();
                return None;
            }
            if let Some(lock) = symbol.lock() {
                self.toggle_lock(lock);
                return None;
            }
        }

        self.state.clear_prefixes();
        if released {
            return None;
        }

        let mut flags = self.state.flags;
        flags.set(Flags::ASCII, key.is_some_and(|key| key.is_ascii()));
        Some(KeyEvent {
            scan_code,
            escaped,
            key,
            flags,
        })
    }

    fn toggle_lock(&mut self, lock: Lock) {
        let LockToggle { latch, changed } = self.state.toggle_lock(lock);
        let update = match self.config.led_cadence {
            LedCadence::ToggleCycle => latch == Latch::Idle,
            LedCadence::EveryChange => changed,
        };
        if !update {
            return;
        }

        let leds = self.state.flags.leds();
        if let Err(error) = self.queue.enqueue(&mut self.port, CMD_SET_LED, Some(leds)) {
            warn!("KBD: LED update {leds:03b} lost: {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;
    use rstest::rstest;

    fn keyboard() -> Keyboard<Vec<u8>> {
        Keyboard::new(Vec::new())
    }

    fn feed<P: Ps2Port>(keyboard: &mut Keyboard<P>, bytes: &[u8]) -> Vec<KeyEvent> {
        bytes.iter().filter_map(|&byte| keyboard.decode(byte)).collect()
    }

    fn typed<P: Ps2Port>(keyboard: &mut Keyboard<P>, bytes: &[u8]) -> String {
        feed(keyboard, bytes)
            .iter()
            .filter_map(KeyEvent::character)
            .collect()
    }

    #[rstest]
    #[case(&hex!("12"), &hex!("F0 12"), Flags::SHIFT)]
    #[case(&hex!("59"), &hex!("F0 59"), Flags::SHIFT)]
    #[case(&hex!("14"), &hex!("F0 14"), Flags::CTRL)]
    #[case(&hex!("E0 14"), &hex!("E0 F0 14"), Flags::CTRL)]
    #[case(&hex!("11"), &hex!("F0 11"), Flags::ALT)]
    #[case(&hex!("E0 11"), &hex!("E0 F0 11"), Flags::ALT)]
    #[case(&hex!("E0 1F"), &hex!("E0 F0 1F"), Flags::SUPER)]
    #[case(&hex!("E0 27"), &hex!("F0 E0 27"), Flags::SUPER)]
    fn test_modifier_press_release(#[case] press: &[u8], #[case] release: &[u8], #[case] bit: u8) {
        let mut kbd = keyboard();

        assert!(feed(&mut kbd, press).is_empty());
        assert_eq!(kbd.state().flags.bits(), 1 << bit);
        assert!(!kbd.state().pending_break);
        assert!(!kbd.state().pending_escape);

        assert!(feed(&mut kbd, release).is_empty());
        assert_eq!(kbd.state().flags.bits(), 0);
        assert!(!kbd.state().pending_break);
        assert!(!kbd.state().pending_escape);
        assert!(kbd.port().is_empty());
    }

    #[test]
    fn test_every_base_key_reports_press_only() {
        for code in 0..=0xFF_u8 {
            let Some(key) = scancode::base(code) else {
                continue;
            };
            if key
                .symbol()
                .is_some_and(|symbol| symbol.modifier().is_some() || symbol.lock().is_some())
            {
                continue;
            }

            let mut kbd = keyboard();
            let press = feed(&mut kbd, &[code]);
            assert_eq!(press.len(), 1, "{code:02X}");
            assert_eq!(press[0].key, Some(key));
            assert_eq!(press[0].flags.is_ascii(), key.is_ascii());
            assert!(feed(&mut kbd, &[BREAK_PREFIX, code]).is_empty(), "{code:02X}");
            assert_eq!(kbd.state(), &KeyboardState::new());
        }
    }

    #[test]
    fn test_escape_selects_extended_table_once() {
        let mut kbd = keyboard();

        let events = feed(&mut kbd, &hex!("E0 75"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].symbol(), Some(KeySymbol::UpArrow));
        assert!(events[0].escaped);
        assert!(!kbd.state().pending_escape);

        let events = feed(&mut kbd, &hex!("75"));
        assert_eq!(events[0].character(), Some('8'));
        assert!(!events[0].escaped);
    }

    #[test]
    fn test_plain_press() {
        let mut kbd = keyboard();
        let events = feed(&mut kbd, &hex!("1C"));
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].key,
            Some(KeyDescriptor::Ascii {
                unshifted: 'a',
                shifted: 'A'
            })
        );
        assert_eq!(events[0].flags, Flags::new(0x80));
        assert_eq!(events[0].character(), Some('a'));
    }

    #[test]
    fn test_shifted_press() {
        let mut kbd = keyboard();
        assert_eq!(typed(&mut kbd, &hex!("12 1C")), "A");
        assert!(kbd.state().flags.is_shift());
        // Shift still held
        assert_eq!(typed(&mut kbd, &hex!("F0 1C 16")), "!");
        assert_eq!(typed(&mut kbd, &hex!("F0 12 1C")), "a");
    }

    #[test]
    fn test_caps_lock_affects_letters_only() {
        let mut kbd = keyboard();
        let events = feed(&mut kbd, &hex!("58 F0 58 1C"));
        assert_eq!(kbd.state().latch(Lock::Caps), Latch::Armed);
        assert!(kbd.state().flags.is_caps_lock());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].flags, Flags::new(0x84));
        assert_eq!(events[0].character(), Some('A'));

        assert_eq!(typed(&mut kbd, &hex!("F0 1C 16 F0 16")), "1");
        assert_eq!(typed(&mut kbd, &hex!("12 1C 16")), "a!");
    }

    #[test]
    fn test_orphan_release() {
        let mut kbd = keyboard();
        assert!(feed(&mut kbd, &hex!("F0 1C")).is_empty());
        assert_eq!(kbd.state(), &KeyboardState::new());
    }

    #[test]
    fn test_unmapped_code() {
        let mut kbd = keyboard();

        // A press of an unmapped code is still reported, with no key
        let events = feed(&mut kbd, &hex!("14 02"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].key, None);
        assert_eq!(events[0].flags, Flags::new(0x10));
        assert_eq!(events[0].character(), None);
        assert_eq!(events[0].symbol(), None);

        assert!(feed(&mut kbd, &hex!("F0 02")).is_empty());
        // Escaped code with no extended entry, even though the base table has one
        let events = feed(&mut kbd, &hex!("E0 1C"));
        assert_eq!(events[0].key, None);
        assert!(!kbd.state().pending_escape);
    }

    #[test]
    fn test_modifiers_merged_into_event() {
        let mut kbd = keyboard();
        let events = feed(&mut kbd, &hex!("14 11 E0 1F 5A"));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].symbol(), Some(KeySymbol::Enter));
        assert_eq!(events[0].flags, Flags::new(0x70));
        assert_eq!(events[0].character(), None);
    }

    #[test]
    fn test_lock_toggle_cycle_sends_leds() {
        let mut kbd = keyboard();

        // Make code of the enabling press turns caps lock on
        feed(&mut kbd, &hex!("58"));
        assert_eq!(kbd.port(), &vec![CMD_SET_LED]);
        feed(&mut kbd, &hex!("FA FA"));
        assert_eq!(kbd.port(), &vec![CMD_SET_LED, 0x04]);
        assert!(kbd.queue().is_empty());

        // Completing the cycle: only the disarming release updates the LEDs
        kbd.port_mut().clear();
        feed(&mut kbd, &hex!("F0 58"));
        assert_eq!(kbd.state().latch(Lock::Caps), Latch::Armed);
        feed(&mut kbd, &hex!("58"));
        assert!(kbd.port().is_empty());
        assert!(kbd.state().flags.is_caps_lock());

        feed(&mut kbd, &hex!("F0 58"));
        assert_eq!(kbd.state().latch(Lock::Caps), Latch::Idle);
        assert!(!kbd.state().flags.is_caps_lock());
        assert_eq!(kbd.port(), &vec![CMD_SET_LED]);
        feed(&mut kbd, &hex!("FA FA"));
        assert_eq!(kbd.port(), &vec![CMD_SET_LED, 0x00]);
        assert!(kbd.queue().is_empty());
    }

    #[test]
    fn test_led_payload_tracks_all_locks() {
        let mut kbd = keyboard();
        feed(&mut kbd, &hex!("77 FA FA F0 77 7E FA FA"));
        assert_eq!(kbd.port(), &hex!("ED 02 ED 03").to_vec());
        assert_eq!(kbd.state().flags.leds(), 0b011);
    }

    #[rstest]
    #[case(LedCadence::ToggleCycle, 3)]
    #[case(LedCadence::EveryChange, 1)]
    fn test_held_lock_led_cadence(#[case] led_cadence: LedCadence, #[case] updates: usize) {
        let config = KeyboardConfig {
            led_cadence,
            ..Default::default()
        };
        let mut kbd = Keyboard::with_config(Vec::new(), config);

        // Typematic repeat of a held caps lock
        for _ in 0..3 {
            feed(&mut kbd, &hex!("58 FA FA"));
        }
        let sent = kbd.port().iter().filter(|&&byte| byte == CMD_SET_LED).count();
        assert_eq!(sent, updates);
        assert!(kbd.state().flags.is_caps_lock());
    }

    #[test]
    fn test_command_replies_keep_prefixes() {
        let mut kbd = keyboard();
        // An ack between the break prefix and its code does not cancel it
        assert!(feed(&mut kbd, &hex!("F0 FA 1C")).is_empty());
        assert!(feed(&mut kbd, &hex!("E0 FE 75"))[0].escaped);
        assert_eq!(kbd.state(), &KeyboardState::new());
    }

    #[test]
    fn test_resend_request() {
        let mut kbd = keyboard();
        feed(&mut kbd, &hex!("7E"));
        feed(&mut kbd, &hex!("FE"));
        // Replays the free slot after the parameter byte
        assert_eq!(kbd.port(), &hex!("ED 00").to_vec());

        let mut kbd = Keyboard::with_config(
            Vec::new(),
            KeyboardConfig {
                queue_mode: QueueMode::Hardened,
                ..Default::default()
            },
        );
        feed(&mut kbd, &hex!("7E FE FA FE FA"));
        assert_eq!(kbd.port(), &hex!("ED ED 01 01").to_vec());
    }

    #[test]
    fn test_hardened_queue_drops_overflow() {
        let mut kbd = Keyboard::with_config(
            Vec::new(),
            KeyboardConfig {
                queue_mode: QueueMode::Hardened,
                ..Default::default()
            },
        );
        // Nine unacknowledged LED updates, two bytes each
        feed(&mut kbd, &[0x58; 9]);
        assert_eq!(kbd.queue().len(), 16);
        assert_eq!(kbd.port().len(), 8);
    }

    #[test]
    fn test_reset() {
        let mut kbd = keyboard();
        feed(&mut kbd, &hex!("12 58 E0"));
        kbd.reset();
        assert_eq!(kbd.state(), &KeyboardState::new());
        assert!(kbd.queue().is_empty());
        assert_eq!(typed(&mut kbd, &hex!("1C")), "a");
    }

    #[rstest]
    #[case('a', 'A', false, false, 'a')]
    #[case('a', 'A', true, false, 'A')]
    #[case('a', 'A', false, true, 'A')]
    #[case('a', 'A', true, true, 'a')]
    #[case('1', '!', false, true, '1')]
    #[case('1', '!', true, true, '!')]
    #[case(';', ':', true, false, ':')]
    fn test_character_selection(
        #[case] unshifted: char,
        #[case] shifted: char,
        #[case] shift: bool,
        #[case] caps: bool,
        #[case] expected: char,
    ) {
        let mut flags = Flags::new(0x80);
        flags.set(Flags::SHIFT, shift);
        flags.set(Flags::CAPS_LOCK, caps);
        let event = KeyEvent {
            scan_code: 0,
            escaped: false,
            key: Some(KeyDescriptor::Ascii { unshifted, shifted }),
            flags,
        };
        assert_eq!(event.character(), Some(expected));
    }
}
