//! Scan code capture files.
//!
//! A capture is plain text: hex bytes separated by whitespace, with an
//! optional `0x` prefix. Everything after `#` on a line is ignored.
//!
//! ```text
//! # shift, a, release a, release shift
//! 12 1C F0 1C F0 12
//! ```

use std::{fmt, fs, num::ParseIntError, path::Path};

pub fn parse_hex_byte(s: &str) -> Result<u8, ParseIntError> {
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u8::from_str_radix(digits, 16)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureError {
    /// 1-based line number
    pub line: usize,
    pub token: String,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {:?} is not a hex byte", self.line, self.token)
    }
}

impl std::error::Error for CaptureError {}

pub fn parse_capture(text: &str) -> Result<Vec<u8>, CaptureError> {
    let mut bytes = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.split('#').next().unwrap_or_default();
        for token in line.split_whitespace() {
            let Ok(byte) = parse_hex_byte(token) else {
                return Err(CaptureError {
                    line: index + 1,
                    token: token.to_string(),
                });
            };
            bytes.push(byte);
        }
    }
    Ok(bytes)
}

pub fn load_capture(path: &Path) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    Ok(parse_capture(&text)?)
}
