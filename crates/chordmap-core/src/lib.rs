// Chordmap Core Library
// Compiles chorded keyboard layouts into firmware lookup tables

pub mod chord;
pub mod compiler;
pub mod config;
pub mod emit;
pub mod key;
pub mod layer;
pub mod scancode;
pub mod shift;
pub mod table;

pub use chord::{chord_count, encode, Chord, ChordEnumerator, MAX_CHORDS};
pub use compiler::{ChordLookup, CompiledKeyboard, CompiledLayer, Keyboard, LayerSource, LayerSpec};
pub use config::{describe_byte, ByteSpec, ConfigError, ControlCode, BUILTIN_CONFIG};
pub use emit::{render, splice, SpliceError};
pub use key::{Key, KeyLayout, LayoutError, MAX_KEYS};
pub use layer::{LayerMap, ResolvedLayer};
pub use scancode::{ScanCodeClassifier, ScanCodeError, ScanCodeTable, ScanRole, SCAN_CODE_SPACE};
pub use shift::{ShiftError, ShiftRule};
pub use table::{CompiledTable, TableBuilder, SENTINEL, TABLE_SIZE};
