// Chordmap Compiled Table
// Dense 256-entry lookup tables indexed by chord bitmask

use std::fmt;

use crate::chord::Chord;
use crate::layer::ResolvedLayer;

/// Entries in every compiled layer table (one per possible bitmask)
pub const TABLE_SIZE: usize = 256;

/// "No output defined for this press pattern"
pub const SENTINEL: u8 = 0x00;

/// A fixed 256-byte table; index = bitmask of pressed keys
#[derive(Clone, PartialEq, Eq)]
pub struct CompiledTable([u8; TABLE_SIZE]);

impl CompiledTable {
    /// Byte produced for a bitmask
    pub fn get(&self, mask: u8) -> u8 {
        self.0[mask as usize]
    }

    pub fn as_bytes(&self) -> &[u8; TABLE_SIZE] {
        &self.0
    }

    /// Count of entries holding something other than the sentinel
    pub fn defined_count(&self) -> usize {
        self.0.iter().filter(|&&b| b != SENTINEL).count()
    }

    /// Fixed-width rows for presentation
    pub fn rows(&self, width: usize) -> std::slice::Chunks<'_, u8> {
        self.0.chunks(width)
    }
}

impl fmt::Debug for CompiledTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.0
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| **b != SENTINEL)
                    .map(|(i, b)| (format!("0x{:02X}", i), format!("0x{:02X}", b))),
            )
            .finish()
    }
}

/// Fills a sentinel-initialized table one chord at a time
#[derive(Debug, Clone)]
pub struct TableBuilder {
    table: [u8; TABLE_SIZE],
    written: usize,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            table: [SENTINEL; TABLE_SIZE],
            written: 0,
        }
    }

    /// Store the byte for a chord at the chord's bitmask
    pub fn set(&mut self, chord: Chord, byte: u8) -> &mut Self {
        let mask = chord.mask() as usize;
        debug_assert_ne!(mask, 0, "chords always press at least one key");
        debug_assert_eq!(self.table[mask], SENTINEL, "chord {} written twice", chord);
        self.table[mask] = byte;
        self.written += 1;
        self
    }

    /// Chords stored so far
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(self) -> CompiledTable {
        CompiledTable(self.table)
    }

    /// Compile a resolved layer in one go
    pub fn from_resolved(layer: &ResolvedLayer) -> CompiledTable {
        let mut builder = Self::new();
        for &(chord, byte) in layer.entries() {
            builder.set(chord, byte);
        }
        log::debug!(
            "layer '{}': {} chords written to table",
            layer.name(),
            builder.written()
        );
        builder.finish()
    }
}
