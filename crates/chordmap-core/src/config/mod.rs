// Chordmap Config API
// TOML keyboard descriptions and output byte parsing

pub mod bytes;
pub mod parser;

pub use bytes::{describe_byte, ByteSpec, ControlCode};
pub use parser::{ConfigError, ConfigToml, BUILTIN_CONFIG, CONFIG_VERSION};
