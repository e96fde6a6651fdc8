// Chordmap Chord Type
// One- or two-key chords and their deterministic enumeration

use std::fmt;

use crate::key::{Key, KeyLayout};

/// Upper bound on chords over one layout: 8 singles + 28 pairs
pub const MAX_CHORDS: usize = 36;

/// Number of chords enumerated over a layout of `keys` keys
pub const fn chord_count(keys: usize) -> usize {
    keys * (keys + 1) / 2
}

/// Bitmask of two keys pressed together
pub fn encode(a: Key, b: Key) -> u8 {
    a.bit() | b.bit()
}

/// An unordered pair of keys from one layout, possibly the same key twice
///
/// Always stored in canonical order (earlier layout position first), so
/// `Chord::new(s, a)` and `Chord::new(a, s)` are equal and hash the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    first: Key,
    second: Key,
}

impl Chord {
    /// Create a chord from two keys in any order
    pub fn new(a: Key, b: Key) -> Self {
        if a.position() <= b.position() {
            Self {
                first: a,
                second: b,
            }
        } else {
            Self {
                first: b,
                second: a,
            }
        }
    }

    /// A single key pressed alone
    pub fn single(key: Key) -> Self {
        Self {
            first: key,
            second: key,
        }
    }

    pub fn first(&self) -> Key {
        self.first
    }

    pub fn second(&self) -> Key {
        self.second
    }

    pub fn is_single(&self) -> bool {
        self.first == self.second
    }

    /// The bitmask firmware sees while this chord is held
    pub fn mask(&self) -> u8 {
        encode(self.first, self.second)
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.first, self.second)
    }
}

/// Iterates every chord of a layout: each key with itself and every later key
///
/// Order is (0,0), (0,1) .. (0,N-1), (1,1), (1,2) .. (N-1,N-1).
#[derive(Debug, Clone)]
pub struct ChordEnumerator<'a> {
    keys: &'a [Key],
    i: usize,
    j: usize,
}

impl<'a> ChordEnumerator<'a> {
    pub fn new(layout: &'a KeyLayout) -> Self {
        Self {
            keys: layout.keys(),
            i: 0,
            j: 0,
        }
    }

    fn remaining(&self) -> usize {
        let n = self.keys.len();
        if self.i >= n {
            return 0;
        }
        // rest of the current row plus every full row after it
        (n - self.j) + chord_count(n - self.i - 1)
    }
}

impl Iterator for ChordEnumerator<'_> {
    type Item = Chord;

    fn next(&mut self) -> Option<Chord> {
        let n = self.keys.len();
        if self.i >= n {
            return None;
        }
        let chord = Chord::new(self.keys[self.i], self.keys[self.j]);
        self.j += 1;
        if self.j == n {
            self.i += 1;
            self.j = self.i;
        }
        Some(chord)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining();
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for ChordEnumerator<'_> {}

impl KeyLayout {
    /// Enumerate every chord over this layout
    pub fn chords(&self) -> ChordEnumerator<'_> {
        ChordEnumerator::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn asetniop() -> KeyLayout {
        KeyLayout::new("letters", "asetniop").unwrap()
    }

    #[test]
    fn test_encoding_is_commutative() {
        let layout = asetniop();
        for &a in layout.keys() {
            for &b in layout.keys() {
                assert_eq!(encode(a, b), encode(b, a));
                assert_eq!(Chord::new(a, b), Chord::new(b, a));
            }
        }
    }

    #[test]
    fn test_chord_canonical_order() {
        let layout = asetniop();
        let a = layout.require('a').unwrap();
        let s = layout.require('s').unwrap();
        let chord = Chord::new(s, a);
        assert_eq!(chord.first(), a);
        assert_eq!(chord.to_string(), "as");
        assert_eq!(chord.mask(), 0xC0);
    }

    #[test]
    fn test_single_key_chord() {
        let layout = asetniop();
        let a = layout.require('a').unwrap();
        let chord = Chord::single(a);
        assert!(chord.is_single());
        assert_eq!(chord.mask(), 0x80);
        assert_eq!(chord.to_string(), "aa");
    }

    #[test]
    fn test_enumeration_count() {
        assert_eq!(asetniop().chords().count(), 36);
        assert_eq!(chord_count(8), MAX_CHORDS);
        let small = KeyLayout::new("small", "xyz").unwrap();
        assert_eq!(small.chords().len(), 6);
    }

    #[test]
    fn test_enumeration_order() {
        let small = KeyLayout::new("small", "xyz").unwrap();
        let names: Vec<String> = small.chords().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["xx", "xy", "xz", "yy", "yz", "zz"]);
    }

    #[test]
    fn test_enumeration_masks_unique() {
        let masks: HashSet<u8> = asetniop().chords().map(|c| c.mask()).collect();
        assert_eq!(masks.len(), 36);
        assert!(!masks.contains(&0));
    }

    #[test]
    fn test_size_hint_tracks_progress() {
        let layout = asetniop();
        let mut chords = layout.chords();
        assert_eq!(chords.len(), 36);
        for _ in 0..9 {
            chords.next();
        }
        assert_eq!(chords.len(), 27);
        assert_eq!(chords.by_ref().count(), 27);
        assert_eq!(chords.len(), 0);
    }
}
