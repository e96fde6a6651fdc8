// Chordmap Config Parser - TOML with Serde
// Parses the versioned keyboard description into typed layouts and layers

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Deserialize;

use super::bytes::ByteSpec;
use crate::compiler::{Keyboard, LayerSource, LayerSpec};
use crate::key::{KeyLayout, LayoutError};
use crate::layer::LayerMap;
use crate::scancode::{ScanCodeError, ScanCodeTable, SCAN_CODE_SPACE};
use crate::shift::{ShiftError, ShiftRule};

/// Configuration format understood by this version
pub const CONFIG_VERSION: u32 = 1;

/// The canonical ASETNIOP configuration shipped with the crate
pub const BUILTIN_CONFIG: &str = include_str!("../../layouts/asetniop.toml");

/// Configuration parser errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("unsupported configuration version {0}, expected {expected}", expected = CONFIG_VERSION)]
    UnsupportedVersion(u32),

    #[error(transparent)]
    Layout(#[from] LayoutError),

    #[error(transparent)]
    ScanCode(#[from] ScanCodeError),

    #[error(transparent)]
    Shift(#[from] ShiftError),

    #[error("invalid byte in {context}: {reason}")]
    InvalidByte { context: String, reason: String },

    #[error("{what} must be a single character, got '{value}'")]
    InvalidMarker { what: &'static str, value: String },

    #[error("'{0}' is not a valid C identifier")]
    InvalidIdentifier(String),

    #[error("configuration defines no layouts")]
    NoLayouts,

    #[error("configuration defines no layers")]
    NoLayers,

    #[error("layout '{0}' is defined more than once")]
    DuplicateLayout(String),

    #[error("layer '{0}' is defined more than once")]
    DuplicateLayer(String),

    #[error("layer '{layer}' refers to unknown layout '{layout}'")]
    UnknownLayout { layer: String, layout: String },

    #[error("layer '{layer}' shifts unknown or later layer '{base}'")]
    UnknownShiftBase { layer: String, base: String },

    #[error("layer '{0}' needs exactly one of 'layout' with 'chords', or 'shift_of'")]
    AmbiguousLayerSource(String),
}

/// Root TOML table
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigToml {
    /// Configuration format version
    pub version: u32,

    /// Keyboard name, used in generated comments
    pub name: String,

    /// Scan-code layout of the physical device
    pub scancodes: ScanCodesToml,

    /// Chord key layouts
    #[serde(default)]
    pub layout: Vec<LayoutToml>,

    /// Output layers, emitted in this order
    #[serde(default)]
    pub layer: Vec<LayerToml>,

    /// Shift overrides
    #[serde(default)]
    pub shift: ShiftToml,
}

/// Scan-code table settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScanCodesToml {
    /// Size of the scan-code space
    #[serde(default = "default_scan_code_space")]
    pub size: usize,

    /// Generated array name
    #[serde(default = "default_scan_code_symbol")]
    pub symbol: String,

    /// Label marking shift keys
    pub shift_marker: String,

    /// Label marking space keys
    pub space_marker: String,

    /// Position-indexed labels, concatenated in order
    pub rows: Vec<String>,
}

fn default_scan_code_space() -> usize {
    SCAN_CODE_SPACE
}

fn default_scan_code_symbol() -> String {
    "keys_map".to_string()
}

/// One chord key layout
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutToml {
    pub name: String,
    /// Key symbols in bit order, most significant first
    pub keys: String,
}

/// One output layer: explicit chords over a layout, or shifted from another layer
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerToml {
    pub name: String,

    /// Generated array name
    pub symbol: String,

    /// Text used in the generated comment ("lower-case", "numeral", ...)
    pub description: String,

    /// Layout the chords are named over
    pub layout: Option<String>,

    /// Chord name to output byte
    pub chords: Option<IndexMap<String, ByteSpec>>,

    /// Earlier layer this one is the shifted form of
    pub shift_of: Option<String>,
}

/// Shift override table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShiftToml {
    #[serde(default)]
    pub overrides: IndexMap<String, ByteSpec>,
}

fn c_identifier() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern is valid")
    })
}

fn check_identifier(symbol: &str) -> Result<(), ConfigError> {
    if c_identifier().is_match(symbol) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier(symbol.to_string()))
    }
}

fn parse_marker(what: &'static str, value: &str) -> Result<char, ConfigError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(ConfigError::InvalidMarker {
            what,
            value: value.to_string(),
        }),
    }
}

fn parse_byte(spec: &ByteSpec, context: impl FnOnce() -> String) -> Result<u8, ConfigError> {
    spec.to_byte().map_err(|reason| ConfigError::InvalidByte {
        context: context(),
        reason,
    })
}

impl Keyboard {
    /// Parse a TOML configuration file
    pub fn from_toml_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let toml_config: ConfigToml =
            toml::from_str(content).map_err(|e| ConfigError::TomlParse(e.to_string()))?;
        toml_config.to_keyboard()
    }

    /// The canonical configuration compiled into the crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml(BUILTIN_CONFIG)
    }
}

impl ConfigToml {
    /// Convert parsed TOML into the typed keyboard description
    pub fn to_keyboard(&self) -> Result<Keyboard, ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }

        let layouts = self.layouts()?;
        let scancodes = ScanCodeTable::from_rows(&self.scancodes.rows, self.scancodes.size)?;
        check_identifier(&self.scancodes.symbol)?;
        let shift_marker = parse_marker("shift_marker", &self.scancodes.shift_marker)?;
        let space_marker = parse_marker("space_marker", &self.scancodes.space_marker)?;
        let shift = self.shift_rule()?;
        let layers = self.layers(&layouts)?;

        log::debug!(
            "config '{}': {} layouts, {} layers, {} shift overrides",
            self.name,
            layouts.len(),
            layers.len(),
            shift.overrides().len()
        );

        Ok(Keyboard {
            name: self.name.clone(),
            layouts,
            scancodes,
            scan_code_symbol: self.scancodes.symbol.clone(),
            shift_marker,
            space_marker,
            shift,
            layers,
        })
    }

    fn layouts(&self) -> Result<Vec<KeyLayout>, ConfigError> {
        if self.layout.is_empty() {
            return Err(ConfigError::NoLayouts);
        }
        let mut layouts: Vec<KeyLayout> = Vec::with_capacity(self.layout.len());
        for entry in &self.layout {
            if layouts.iter().any(|l| l.name() == entry.name) {
                return Err(ConfigError::DuplicateLayout(entry.name.clone()));
            }
            layouts.push(KeyLayout::new(&entry.name, &entry.keys)?);
        }
        Ok(layouts)
    }

    fn shift_rule(&self) -> Result<ShiftRule, ConfigError> {
        let mut rule = ShiftRule::new();
        for (from, to) in &self.shift.overrides {
            let from_byte = ByteSpec::parse_text(from).map_err(|reason| ConfigError::InvalidByte {
                context: format!("shift override key '{}'", from),
                reason,
            })?;
            let to_byte = parse_byte(to, || format!("shift override for '{}'", from))?;
            rule.insert(from_byte, to_byte)?;
        }
        Ok(rule)
    }

    fn layers(&self, layouts: &[KeyLayout]) -> Result<Vec<LayerSpec>, ConfigError> {
        if self.layer.is_empty() {
            return Err(ConfigError::NoLayers);
        }
        let mut seen: HashSet<&str> = HashSet::new();
        let mut layers = Vec::with_capacity(self.layer.len());

        for entry in &self.layer {
            check_identifier(&entry.symbol)?;

            let source = match (&entry.layout, &entry.chords, &entry.shift_of) {
                (Some(layout_name), Some(chords), None) => {
                    let layout = layouts
                        .iter()
                        .find(|l| l.name() == layout_name)
                        .ok_or_else(|| ConfigError::UnknownLayout {
                            layer: entry.name.clone(),
                            layout: layout_name.clone(),
                        })?;
                    let mut map = LayerMap::new(&entry.name, layout.clone());
                    for (chord, value) in chords {
                        let byte = parse_byte(value, || {
                            format!("layer '{}' chord '{}'", entry.name, chord)
                        })?;
                        map.insert_named(chord, byte)?;
                    }
                    LayerSource::Chords(map)
                }
                (None, None, Some(base)) => {
                    // only earlier layers can be shifted, which also rules out cycles
                    if !seen.contains(base.as_str()) {
                        return Err(ConfigError::UnknownShiftBase {
                            layer: entry.name.clone(),
                            base: base.clone(),
                        });
                    }
                    LayerSource::Shifted { of: base.clone() }
                }
                _ => return Err(ConfigError::AmbiguousLayerSource(entry.name.clone())),
            };

            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateLayer(entry.name.clone()));
            }

            layers.push(LayerSpec {
                name: entry.name.clone(),
                symbol: entry.symbol.clone(),
                description: entry.description.clone(),
                source,
            });
        }
        Ok(layers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        version = 1
        name = "tiny"

        [scancodes]
        size = 8
        shift_marker = "V"
        space_marker = "N"
        rows = ["  xy", "V N "]

        [[layout]]
        name = "keys"
        keys = "xy"

        [[layer]]
        name = "lower"
        symbol = "lower_map"
        description = "lower-case"
        layout = "keys"

        [layer.chords]
        xx = "a"
        xy = "?"
        yy = 0x13

        [[layer]]
        name = "upper"
        symbol = "upper_map"
        description = "upper-case"
        shift_of = "lower"

        [shift.overrides]
        "?" = "/"
    "#;

    #[test]
    fn test_minimal_config() {
        let keyboard = Keyboard::from_toml(MINIMAL).unwrap();
        assert_eq!(keyboard.name, "tiny");
        assert_eq!(keyboard.layouts.len(), 1);
        assert_eq!(keyboard.scancodes.len(), 8);
        assert_eq!(keyboard.scan_code_symbol, "keys_map");
        assert_eq!(keyboard.shift_marker, 'V');
        assert_eq!(keyboard.layers.len(), 2);
        assert_eq!(keyboard.shift.apply(b'?'), b'/');
        assert!(matches!(
            keyboard.layers[1].source,
            LayerSource::Shifted { ref of } if of == "lower"
        ));
    }

    #[test]
    fn test_builtin_config_parses() {
        let keyboard = Keyboard::builtin().unwrap();
        assert_eq!(keyboard.name, "asetniop");
        let names: Vec<&str> = keyboard.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["lower", "upper", "numeral", "symbol"]);
        assert_eq!(keyboard.layouts[0].symbols(), "asetniop");
        assert_eq!(keyboard.layouts[1].symbols(), "12347890");
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let content = MINIMAL.replace("version = 1", "version = 1\ncolour = \"red\"");
        assert!(matches!(
            Keyboard::from_toml(&content),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_version_checked() {
        let content = MINIMAL.replace("version = 1", "version = 2");
        assert!(matches!(
            Keyboard::from_toml(&content),
            Err(ConfigError::UnsupportedVersion(2))
        ));
        assert_eq!(
            Keyboard::from_toml(&content).unwrap_err().to_string(),
            "unsupported configuration version 2, expected 1"
        );
    }

    #[test]
    fn test_shift_of_must_name_earlier_layer() {
        let content = MINIMAL.replace("shift_of = \"lower\"", "shift_of = \"upper\"");
        let err = Keyboard::from_toml(&content).unwrap_err();
        assert_eq!(
            err.to_string(),
            "layer 'upper' shifts unknown or later layer 'upper'"
        );
    }

    #[test]
    fn test_unknown_layout() {
        let content = MINIMAL.replace("layout = \"keys\"", "layout = \"missing\"");
        assert!(matches!(
            Keyboard::from_toml(&content),
            Err(ConfigError::UnknownLayout { .. })
        ));
    }

    #[test]
    fn test_invalid_symbol_name() {
        let content = MINIMAL.replace("symbol = \"upper_map\"", "symbol = \"upper map\"");
        assert!(matches!(
            Keyboard::from_toml(&content),
            Err(ConfigError::InvalidIdentifier(ref s)) if s == "upper map"
        ));
    }

    #[test]
    fn test_invalid_byte_value() {
        let content = MINIMAL.replace("xx = \"a\"", "xx = \"NOPE\"");
        let err = Keyboard::from_toml(&content).unwrap_err();
        assert!(err.to_string().starts_with("invalid byte in layer 'lower' chord 'xx'"));
    }

    #[test]
    fn test_layer_entry_errors_surface() {
        let content = MINIMAL.replace("xx = \"a\"", "xq = \"a\"");
        assert!(matches!(
            Keyboard::from_toml(&content),
            Err(ConfigError::Layout(LayoutError::UnknownKey { symbol: 'q', .. }))
        ));
    }

    #[test]
    fn test_scan_code_length_checked() {
        let content = MINIMAL.replace("size = 8", "size = 256");
        assert!(matches!(
            Keyboard::from_toml(&content),
            Err(ConfigError::ScanCode(ScanCodeError::WrongLength {
                expected: 256,
                actual: 8
            }))
        ));
    }

    #[test]
    fn test_layer_needs_one_source() {
        let content = MINIMAL.replace(
            "shift_of = \"lower\"",
            "shift_of = \"lower\"\nlayout = \"keys\"",
        );
        assert!(matches!(
            Keyboard::from_toml(&content),
            Err(ConfigError::AmbiguousLayerSource(ref name)) if name == "upper"
        ));
    }
}
