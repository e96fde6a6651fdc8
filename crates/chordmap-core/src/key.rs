// Chordmap Key Layout
// Ordered physical key set with one bitmask bit per key

use std::fmt;

use smallvec::SmallVec;

/// Keys that fit in a single byte of chord bitmask
pub const MAX_KEYS: usize = 8;

/// Errors raised while building layouts and the layer maps over them
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("layout '{0}' has no keys")]
    Empty(String),

    #[error("layout '{name}' has {count} keys, at most 8 fit in a chord bitmask")]
    TooManyKeys { name: String, count: usize },

    #[error("layout '{name}' repeats key '{symbol}'")]
    DuplicateKey { name: String, symbol: char },

    #[error("layout '{name}' key {symbol:?} is not a printable ASCII character")]
    InvalidSymbol { name: String, symbol: char },

    #[error("key {symbol:?} is not part of layout '{layout}'")]
    UnknownKey { layout: String, symbol: char },

    #[error("key '{symbol}' of chord '{chord}' belongs to another layout than '{layout}'")]
    ForeignKey {
        layout: String,
        chord: String,
        symbol: char,
    },

    #[error("no layout contains every key of chord '{0}'")]
    NoLayoutForChord(String),

    #[error("chord '{chord}' in layer '{layer}' must name one or two keys")]
    MalformedChord { layer: String, chord: String },

    #[error("layer '{layer}' maps chord '{chord}' more than once")]
    ConflictingEntry { layer: String, chord: String },

    #[error("layer '{layer}' maps chord '{chord}' to the null sentinel")]
    SentinelEntry { layer: String, chord: String },

    #[error("layer '{layer}' has no entry for chord '{chord}'")]
    MissingEntry { layer: String, chord: String },
}

/// A single physical key of a chord layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key {
    symbol: char,
    position: u8,
    bit: u8,
}

impl Key {
    /// The symbol naming this key
    pub fn symbol(self) -> char {
        self.symbol
    }

    /// Position of the key in its layout (0 = first)
    pub fn position(self) -> usize {
        self.position as usize
    }

    /// The bitmask bit this key contributes to a chord
    pub fn bit(self) -> u8 {
        self.bit
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}

/// Ordered set of keys; the first key owns the highest bit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLayout {
    name: String,
    keys: SmallVec<[Key; MAX_KEYS]>,
}

impl KeyLayout {
    /// Build a layout from its symbols in order
    ///
    /// # Arguments
    /// * `name` - Identifier used in error messages and configuration references
    /// * `symbols` - One character per key, first key gets bit `1 << (N-1)`
    pub fn new(name: &str, symbols: &str) -> Result<Self, LayoutError> {
        let symbols: Vec<char> = symbols.chars().collect();
        if symbols.is_empty() {
            return Err(LayoutError::Empty(name.to_string()));
        }
        if symbols.len() > MAX_KEYS {
            return Err(LayoutError::TooManyKeys {
                name: name.to_string(),
                count: symbols.len(),
            });
        }

        let count = symbols.len();
        let mut keys: SmallVec<[Key; MAX_KEYS]> = SmallVec::new();
        for (i, &symbol) in symbols.iter().enumerate() {
            if !symbol.is_ascii_graphic() {
                return Err(LayoutError::InvalidSymbol {
                    name: name.to_string(),
                    symbol,
                });
            }
            if keys.iter().any(|k| k.symbol == symbol) {
                return Err(LayoutError::DuplicateKey {
                    name: name.to_string(),
                    symbol,
                });
            }
            keys.push(Key {
                symbol,
                position: i as u8,
                bit: 1 << (count - 1 - i),
            });
        }

        Ok(Self {
            name: name.to_string(),
            keys,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keys in layout order
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Look up a key by symbol
    pub fn key(&self, symbol: char) -> Option<Key> {
        self.keys.iter().copied().find(|k| k.symbol == symbol)
    }

    /// Look up a key by symbol, failing with a configuration error
    pub fn require(&self, symbol: char) -> Result<Key, LayoutError> {
        self.key(symbol).ok_or_else(|| LayoutError::UnknownKey {
            layout: self.name.clone(),
            symbol,
        })
    }

    pub fn contains(&self, symbol: char) -> bool {
        self.key(symbol).is_some()
    }

    /// Bit assigned to a symbol
    pub fn bit(&self, symbol: char) -> Option<u8> {
        self.key(symbol).map(Key::bit)
    }

    /// The symbols of this layout as a string, in order
    pub fn symbols(&self) -> String {
        self.keys.iter().map(|k| k.symbol).collect()
    }
}
