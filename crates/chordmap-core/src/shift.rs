// Chordmap Shift Transform
// Derives a shifted layer from a resolved source layer

use indexmap::IndexMap;

use crate::layer::ResolvedLayer;
use crate::table::SENTINEL;

/// Errors that can occur while building a shift rule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShiftError {
    #[error("shift override for 0x{from:02X} targets the null sentinel")]
    SentinelTarget { from: u8 },

    #[error("shift override cannot start from the null sentinel")]
    SentinelSource,

    #[error("shift override for {from:?} is shadowed by the lowercase letter rule")]
    ShadowedByLetterRule { from: char },

    #[error("shift override for 0x{from:02X} is defined twice")]
    DuplicateOverride { from: u8 },
}

/// Lower byte to shifted byte: ASCII letters upper-case generically,
/// everything else goes through an explicit override table or stays put
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftRule {
    overrides: IndexMap<u8, u8>,
}

impl ShiftRule {
    /// A rule with only the generic letter conversion
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an explicit override
    pub fn insert(&mut self, from: u8, to: u8) -> Result<(), ShiftError> {
        if from == SENTINEL {
            return Err(ShiftError::SentinelSource);
        }
        if to == SENTINEL {
            return Err(ShiftError::SentinelTarget { from });
        }
        if from.is_ascii_lowercase() {
            return Err(ShiftError::ShadowedByLetterRule {
                from: from as char,
            });
        }
        if self.overrides.contains_key(&from) {
            return Err(ShiftError::DuplicateOverride { from });
        }
        self.overrides.insert(from, to);
        Ok(())
    }

    pub fn overrides(&self) -> &IndexMap<u8, u8> {
        &self.overrides
    }

    /// Shift one byte
    pub fn apply(&self, byte: u8) -> u8 {
        if byte.is_ascii_lowercase() {
            return byte.to_ascii_uppercase();
        }
        self.overrides.get(&byte).copied().unwrap_or(byte)
    }

    /// Derive a whole layer from its source, chord for chord
    pub fn derive(&self, name: &str, source: &ResolvedLayer) -> ResolvedLayer {
        ResolvedLayer::from_entries(
            name,
            source
                .entries()
                .iter()
                .map(|&(chord, byte)| (chord, self.apply(byte))),
        )
    }
}
