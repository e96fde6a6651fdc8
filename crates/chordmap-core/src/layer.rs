// Chordmap Layer Map
// Explicit chord-to-byte tables and their resolution over a layout

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::chord::{Chord, MAX_CHORDS};
use crate::key::{KeyLayout, LayoutError};
use crate::table::SENTINEL;

/// Explicit mapping from chords to output bytes for one named layer
#[derive(Debug, Clone)]
pub struct LayerMap {
    name: String,
    layout: KeyLayout,
    entries: IndexMap<Chord, u8>,
}

impl LayerMap {
    /// Create an empty layer over a layout
    pub fn new(name: &str, layout: KeyLayout) -> Self {
        Self {
            name: name.to_string(),
            layout,
            entries: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &KeyLayout {
        &self.layout
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add an entry for a chord
    ///
    /// The chord must be built from this layer's layout. The sentinel byte
    /// is refused: an explicit null would look exactly like an omitted chord
    /// to the firmware.
    pub fn insert(&mut self, chord: Chord, byte: u8) -> Result<(), LayoutError> {
        for key in [chord.first(), chord.second()] {
            if self.layout.key(key.symbol()) != Some(key) {
                return Err(LayoutError::ForeignKey {
                    layout: self.layout.name().to_string(),
                    chord: chord.to_string(),
                    symbol: key.symbol(),
                });
            }
        }
        if byte == SENTINEL {
            return Err(LayoutError::SentinelEntry {
                layer: self.name.clone(),
                chord: chord.to_string(),
            });
        }
        if self.entries.contains_key(&chord) {
            return Err(LayoutError::ConflictingEntry {
                layer: self.name.clone(),
                chord: chord.to_string(),
            });
        }
        self.entries.insert(chord, byte);
        Ok(())
    }

    /// Add an entry named by its key symbols, e.g. `"as"`, `"sa"` or `"a"`
    ///
    /// A single symbol is shorthand for the key pressed alone.
    pub fn insert_named(&mut self, name: &str, byte: u8) -> Result<(), LayoutError> {
        let chord = self.parse_chord(name)?;
        self.insert(chord, byte)
    }

    /// Parse a chord name against this layer's layout
    pub fn parse_chord(&self, name: &str) -> Result<Chord, LayoutError> {
        let symbols: Vec<char> = name.chars().collect();
        match symbols.as_slice() {
            [a] => Ok(Chord::single(self.layout.require(*a)?)),
            [a, b] => Ok(Chord::new(
                self.layout.require(*a)?,
                self.layout.require(*b)?,
            )),
            _ => Err(LayoutError::MalformedChord {
                layer: self.name.clone(),
                chord: name.to_string(),
            }),
        }
    }

    pub fn get(&self, chord: &Chord) -> Option<u8> {
        self.entries.get(chord).copied()
    }

    /// Drop an entry, returning its byte
    pub fn remove(&mut self, chord: &Chord) -> Option<u8> {
        self.entries.shift_remove(chord)
    }

    /// Resolve every enumerated chord of the layout to its byte
    ///
    /// Fails on the first chord without an entry; there is no default.
    pub fn resolve(&self) -> Result<ResolvedLayer, LayoutError> {
        let mut entries = SmallVec::new();
        for chord in self.layout.chords() {
            let byte = self.get(&chord).ok_or_else(|| LayoutError::MissingEntry {
                layer: self.name.clone(),
                chord: chord.to_string(),
            })?;
            log::trace!(
                "layer '{}': {} -> mask 0x{:02X} byte 0x{:02X}",
                self.name,
                chord,
                chord.mask(),
                byte
            );
            entries.push((chord, byte));
        }
        Ok(ResolvedLayer {
            name: self.name.clone(),
            entries,
        })
    }
}

/// A layer resolved over its full chord domain, in enumeration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLayer {
    name: String,
    entries: SmallVec<[(Chord, u8); MAX_CHORDS]>,
}

impl ResolvedLayer {
    /// Build a resolved layer from entries already covering a chord domain
    pub(crate) fn from_entries(
        name: &str,
        entries: impl IntoIterator<Item = (Chord, u8)>,
    ) -> Self {
        Self {
            name: name.to_string(),
            entries: entries.into_iter().collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[(Chord, u8)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Byte resolved for a bitmask, if a chord produces that mask
    pub fn get(&self, mask: u8) -> Option<u8> {
        self.entries
            .iter()
            .find(|(chord, _)| chord.mask() == mask)
            .map(|&(_, byte)| byte)
    }

    /// Whether two layers produce the same byte for every chord
    pub fn same_bytes(&self, other: &ResolvedLayer) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((a, x), (b, y))| a.mask() == b.mask() && x == y)
    }
}
