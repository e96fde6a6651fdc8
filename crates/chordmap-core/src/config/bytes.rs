// Chordmap Config - Output Byte Values
// Parses the byte side of layer entries and shift overrides

use serde::Deserialize;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

/// Control codes that can be named instead of spelled as escapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive)]
pub enum ControlCode {
    #[strum(to_string = "BS", serialize = "BACKSPACE")]
    Backspace,
    #[strum(to_string = "TAB")]
    Tab,
    #[strum(to_string = "LF", serialize = "NEWLINE")]
    LineFeed,
    #[strum(to_string = "CR", serialize = "RETURN")]
    Return,
    #[strum(to_string = "ESC", serialize = "ESCAPE")]
    Escape,
    #[strum(to_string = "CTRL", serialize = "CONTROL")]
    Ctrl,
    #[strum(to_string = "ALT")]
    Alt,
    #[strum(to_string = "DEL", serialize = "DELETE")]
    Delete,
}

impl ControlCode {
    /// The byte firmware receives for this code
    ///
    /// The firmware handles CTRL and ALT with the same byte.
    pub fn byte(self) -> u8 {
        match self {
            ControlCode::Backspace => 0x08,
            ControlCode::Tab => 0x09,
            ControlCode::LineFeed => 0x0A,
            ControlCode::Return => 0x0D,
            ControlCode::Escape => 0x1B,
            ControlCode::Ctrl => 0x1E,
            ControlCode::Alt => 0x1E,
            ControlCode::Delete => 0x7F,
        }
    }

    /// Every named code that produces `byte`
    pub fn names_for(byte: u8) -> Vec<ControlCode> {
        ControlCode::iter().filter(|c| c.byte() == byte).collect()
    }
}

/// Human-readable rendering of an output byte
pub fn describe_byte(byte: u8) -> String {
    let names = ControlCode::names_for(byte);
    if !names.is_empty() {
        let names: Vec<String> = names.iter().map(|c| c.to_string()).collect();
        return format!("0x{:02X} {}", byte, names.join("/"));
    }
    if byte.is_ascii_graphic() || byte == b' ' {
        return format!("0x{:02X} '{}'", byte, byte as char);
    }
    format!("0x{:02X}", byte)
}

/// Byte value as written in a configuration file
///
/// Accepts an integer (`17`), a single ASCII character (`"w"`, `"\b"`)
/// or a control code name (`"ESC"`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ByteSpec {
    Code(u8),
    Text(String),
}

impl ByteSpec {
    /// Parse text the same way a `Text` value is parsed
    pub fn parse_text(text: &str) -> Result<u8, String> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii() => Ok(c as u8),
            (Some(c), None) => Err(format!("{:?} is not an ASCII character", c)),
            (None, _) => Err("empty byte value".to_string()),
            _ => text
                .parse::<ControlCode>()
                .map(ControlCode::byte)
                .map_err(|_| format!("'{}' is neither a single character nor a control code name", text)),
        }
    }

    pub fn to_byte(&self) -> Result<u8, String> {
        match self {
            ByteSpec::Code(code) => Ok(*code),
            ByteSpec::Text(text) => Self::parse_text(text),
        }
    }
}
