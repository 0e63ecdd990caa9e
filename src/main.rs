use clap::Parser;
use std::path::PathBuf;
use tracing::{Level, info};

use ps2_scan::host::capture::{load_capture, parse_hex_byte};
use ps2_scan::host::logging::{setup_logging_file, setup_logging_stdio};
use ps2_scan::host::port::RecordingPort;
use ps2_scan::keyboard::command::QueueMode;
use ps2_scan::keyboard::scancode::KeyDescriptor;
use ps2_scan::{KeyEvent, Keyboard, KeyboardConfig, LedCadence};

/// PS/2 scan code replay
/// Feeds a captured scan code stream through the keyboard decoder
#[derive(Parser)]
#[command(name = "ps2-replay")]
#[command(about = "Replay PS/2 scan codes through the keyboard decoder")]
struct Args {
    /// Scan code bytes in hex, e.g. `12 1C F0 1C F0 12`
    #[arg(value_parser = parse_hex_byte)]
    bytes: Vec<u8>,

    /// Read scan codes from a capture file
    #[arg(long, conflicts_with = "bytes")]
    file: Option<PathBuf>,

    /// Reject commands that overflow the queue and resend from the read cursor
    #[arg(long)]
    hardened: bool,

    /// Only update the LEDs when a lock actually changes
    #[arg(long)]
    led_every_change: bool,

    /// Write logs to a file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn describe(event: &KeyEvent) -> String {
    let key = match event.key {
        Some(KeyDescriptor::Ascii { unshifted, shifted }) => format!("{unshifted:?}/{shifted:?}"),
        Some(KeyDescriptor::Symbol(symbol)) => format!("{symbol:?}"),
        None => "-".to_string(),
    };
    let prefix = if event.escaped { "E0 " } else { "" };
    match event.character() {
        Some(c) => format!("{prefix}{:02X} {key} {:?} {c:?}", event.scan_code, event.flags),
        None => format!("{prefix}{:02X} {key} {:?}", event.scan_code, event.flags),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let level = if args.verbose {
        Level::TRACE
    } else {
        Level::INFO
    };
    match &args.log_file {
        Some(path) => setup_logging_file(level, path)?,
        None => setup_logging_stdio(level),
    }

    let bytes = match &args.file {
        Some(path) => load_capture(path)?,
        None => args.bytes.clone(),
    };

    let config = KeyboardConfig {
        queue_mode: if args.hardened {
            QueueMode::Hardened
        } else {
            QueueMode::Compatible
        },
        led_cadence: if args.led_every_change {
            LedCadence::EveryChange
        } else {
            LedCadence::ToggleCycle
        },
    };
    info!("Replaying {} byte(s), {:?}", bytes.len(), config);

    let mut keyboard = Keyboard::with_config(RecordingPort::default(), config);
    let mut events = 0;
    for byte in bytes {
        if let Some(event) = keyboard.decode(byte) {
            println!("{}", describe(&event));
            events += 1;
        }
    }

    info!("{events} event(s)");
    info!("Sent to keyboard: {:02X?}", keyboard.port().sent());
    info!(
        "Final {:?}, {} byte(s) unacknowledged",
        keyboard.state().flags,
        keyboard.queue().len()
    );
    Ok(())
}
