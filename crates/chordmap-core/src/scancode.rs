// Chordmap Scan Code Table
// Positional role labels for the raw scan-code space of the physical device

use crate::key::KeyLayout;

/// Scan codes reported by the reference device
pub const SCAN_CODE_SPACE: usize = 256;

/// Characters per emitted row of the scan-code literal
pub const ROW_WIDTH: usize = 64;

/// Label for a scan code that plays no part in chording
pub const UNUSED_LABEL: char = ' ';

/// Errors that can occur while building or classifying a scan-code table
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanCodeError {
    #[error("scan-code table has {actual} entries, expected {expected}")]
    WrongLength { expected: usize, actual: usize },

    #[error("scan code {code} has label {label:?}, labels must be printable ASCII or blank")]
    InvalidLabel { code: usize, label: char },

    #[error("scan code {code} has label {label:?}, which is not a key, marker or digit")]
    UnknownLabel { code: usize, label: char },

    #[error("marker {marker:?} collides with a key of layout '{layout}'")]
    MarkerCollision { marker: char, layout: String },

    #[error("shift and space markers must differ, both are {0:?}")]
    SameMarkers(char),

    #[error("marker {0:?} must be a printable ASCII character")]
    InvalidMarker(char),
}

/// What a single scan code means to the chord firmware
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanRole {
    /// Not wired into chording
    Unused,
    /// Toggles the shifted layer
    Shift,
    /// Thumb space key
    Space,
    /// A digit that is not a chord key (thumb modifiers such as `5`/`6`)
    Digit(char),
    /// A chord key: contributes `bit` to the pressed-key bitmask of `layout`
    Key { layout: usize, symbol: char, bit: u8 },
}

impl ScanRole {
    /// Bitmask bit contributed while this scan code is held
    pub fn bit(&self) -> Option<u8> {
        match self {
            ScanRole::Key { bit, .. } => Some(*bit),
            _ => None,
        }
    }
}

/// Literal position-indexed scan-code labels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanCodeTable {
    labels: String,
}

impl ScanCodeTable {
    /// Build from a literal string whose length must equal `size`
    pub fn new(literal: &str, size: usize) -> Result<Self, ScanCodeError> {
        for (code, label) in literal.chars().enumerate() {
            if label != UNUSED_LABEL && !label.is_ascii_graphic() {
                return Err(ScanCodeError::InvalidLabel { code, label });
            }
        }
        // all ASCII from here, so bytes == chars
        if literal.len() != size {
            return Err(ScanCodeError::WrongLength {
                expected: size,
                actual: literal.len(),
            });
        }
        Ok(Self {
            labels: literal.to_string(),
        })
    }

    /// Build from presentation rows concatenated in order
    pub fn from_rows<I, S>(rows: I, size: usize) -> Result<Self, ScanCodeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let literal: String = rows.into_iter().map(|r| r.as_ref().to_string()).collect();
        Self::new(&literal, size)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.labels
    }

    /// Fixed-width slices of the literal, for presentation only
    pub fn rows(&self, width: usize) -> impl Iterator<Item = &str> + '_ {
        let width = width.max(1);
        (0..self.labels.len())
            .step_by(width)
            .map(move |start| &self.labels[start..(start + width).min(self.labels.len())])
    }

    /// Classify every scan code
    pub fn classify(&self, classifier: &ScanCodeClassifier<'_>) -> Result<Vec<ScanRole>, ScanCodeError> {
        self.labels
            .chars()
            .enumerate()
            .map(|(code, label)| classifier.classify(code, label))
            .collect()
    }
}

/// Maps labels to roles using the active layouts and the two thumb markers
#[derive(Debug, Clone)]
pub struct ScanCodeClassifier<'a> {
    layouts: &'a [KeyLayout],
    shift_marker: char,
    space_marker: char,
}

impl<'a> ScanCodeClassifier<'a> {
    pub fn new(
        layouts: &'a [KeyLayout],
        shift_marker: char,
        space_marker: char,
    ) -> Result<Self, ScanCodeError> {
        for marker in [shift_marker, space_marker] {
            if !marker.is_ascii_graphic() {
                return Err(ScanCodeError::InvalidMarker(marker));
            }
            if let Some(layout) = layouts.iter().find(|l| l.contains(marker)) {
                return Err(ScanCodeError::MarkerCollision {
                    marker,
                    layout: layout.name().to_string(),
                });
            }
        }
        if shift_marker == space_marker {
            return Err(ScanCodeError::SameMarkers(shift_marker));
        }
        Ok(Self {
            layouts,
            shift_marker,
            space_marker,
        })
    }

    /// Role of one label; a symbol shared by layouts belongs to the first
    pub fn classify(&self, code: usize, label: char) -> Result<ScanRole, ScanCodeError> {
        if label == UNUSED_LABEL {
            return Ok(ScanRole::Unused);
        }
        if label == self.shift_marker {
            return Ok(ScanRole::Shift);
        }
        if label == self.space_marker {
            return Ok(ScanRole::Space);
        }
        for (index, layout) in self.layouts.iter().enumerate() {
            if let Some(key) = layout.key(label) {
                return Ok(ScanRole::Key {
                    layout: index,
                    symbol: label,
                    bit: key.bit(),
                });
            }
        }
        if label.is_ascii_digit() {
            return Ok(ScanRole::Digit(label));
        }
        Err(ScanCodeError::UnknownLabel { code, label })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layouts() -> Vec<KeyLayout> {
        vec![
            KeyLayout::new("letters", "asetniop").unwrap(),
            KeyLayout::new("numerals", "12347890").unwrap(),
        ]
    }

    fn literal() -> String {
        let mut s = String::from("  1234567890    aset  niop    aset  niop  V VVVV NNNN V  N      ");
        s.push_str(&" ".repeat(SCAN_CODE_SPACE - s.len()));
        s
    }

    #[test]
    fn test_length_must_match() {
        let err = ScanCodeTable::new("  aset", SCAN_CODE_SPACE).unwrap_err();
        assert_eq!(
            err,
            ScanCodeError::WrongLength {
                expected: 256,
                actual: 6
            }
        );
        assert!(ScanCodeTable::new(&literal(), SCAN_CODE_SPACE).is_ok());
    }

    #[test]
    fn test_non_ascii_label_rejected() {
        let mut s = literal();
        s.replace_range(0..1, "\t");
        let err = ScanCodeTable::new(&s, SCAN_CODE_SPACE).unwrap_err();
        assert_eq!(err, ScanCodeError::InvalidLabel { code: 0, label: '\t' });
    }

    #[test]
    fn test_rows_are_presentation_only() {
        let table = ScanCodeTable::new(&literal(), SCAN_CODE_SPACE).unwrap();
        let rows: Vec<&str> = table.rows(ROW_WIDTH).collect();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.len() == ROW_WIDTH));
        assert_eq!(rows.concat(), table.as_str());

        let rebuilt = ScanCodeTable::from_rows(&rows, SCAN_CODE_SPACE).unwrap();
        assert_eq!(rebuilt, table);
    }

    #[test]
    fn test_classification() {
        let layouts = layouts();
        let classifier = ScanCodeClassifier::new(&layouts, 'V', 'N').unwrap();
        let table = ScanCodeTable::new(&literal(), SCAN_CODE_SPACE).unwrap();
        let roles = table.classify(&classifier).unwrap();

        assert_eq!(roles[0], ScanRole::Unused);
        assert_eq!(
            roles[2],
            ScanRole::Key {
                layout: 1,
                symbol: '1',
                bit: 0x80
            }
        );
        assert_eq!(roles[6], ScanRole::Digit('5'));
        assert_eq!(roles[16].bit(), Some(0x80));
        assert_eq!(roles[25].bit(), Some(0x01));
        assert_eq!(roles[42], ScanRole::Shift);
        assert_eq!(roles[49], ScanRole::Space);
        assert_eq!(roles[42].bit(), None);
    }

    #[test]
    fn test_unknown_label() {
        let layouts = layouts();
        let classifier = ScanCodeClassifier::new(&layouts, 'V', 'N').unwrap();
        assert_eq!(
            classifier.classify(7, 'q'),
            Err(ScanCodeError::UnknownLabel { code: 7, label: 'q' })
        );
    }

    #[test]
    fn test_marker_validation() {
        let layouts = layouts();
        assert_eq!(
            ScanCodeClassifier::new(&layouts, 'a', 'N').unwrap_err(),
            ScanCodeError::MarkerCollision {
                marker: 'a',
                layout: "letters".to_string()
            }
        );
        assert_eq!(
            ScanCodeClassifier::new(&layouts, 'V', 'V').unwrap_err(),
            ScanCodeError::SameMarkers('V')
        );
    }
}
