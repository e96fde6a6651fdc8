// Chordmap Compiler
// Drives layouts, layer maps and shift rules into compiled firmware tables

use crate::chord::Chord;
use crate::config::ConfigError;
use crate::key::{KeyLayout, LayoutError};
use crate::layer::{LayerMap, ResolvedLayer};
use crate::scancode::{ScanCodeClassifier, ScanCodeTable, ScanRole};
use crate::shift::ShiftRule;
use crate::table::{CompiledTable, TableBuilder};

/// Where the bytes of a layer come from
#[derive(Debug, Clone)]
pub enum LayerSource {
    /// Explicit chord table over one layout
    Chords(LayerMap),
    /// The shifted form of an earlier layer
    Shifted { of: String },
}

/// One output layer as configured
#[derive(Debug, Clone)]
pub struct LayerSpec {
    pub name: String,
    /// Generated C array name
    pub symbol: String,
    /// Text for the generated comment
    pub description: String,
    pub source: LayerSource,
}

/// Typed, validated keyboard description
#[derive(Debug, Clone)]
pub struct Keyboard {
    pub name: String,
    /// Chord layouts; the first one is the primary layout
    pub layouts: Vec<KeyLayout>,
    pub scancodes: ScanCodeTable,
    /// Generated C array name for the scan-code table
    pub scan_code_symbol: String,
    pub shift_marker: char,
    pub space_marker: char,
    pub shift: ShiftRule,
    /// Layers in emission order
    pub layers: Vec<LayerSpec>,
}

/// A layer after resolution and table assembly
#[derive(Debug, Clone)]
pub struct CompiledLayer {
    pub name: String,
    pub symbol: String,
    pub description: String,
    /// Index into the keyboard's layouts
    pub layout: usize,
    pub resolved: ResolvedLayer,
    pub table: CompiledTable,
}

/// Everything the emitter needs
#[derive(Debug, Clone)]
pub struct CompiledKeyboard {
    pub name: String,
    pub layouts: Vec<KeyLayout>,
    pub scancodes: ScanCodeTable,
    pub scan_code_symbol: String,
    pub scan_roles: Vec<ScanRole>,
    pub shift_marker: char,
    pub space_marker: char,
    pub layers: Vec<CompiledLayer>,
}

impl Keyboard {
    fn layout_index(&self, name: &str) -> Option<usize> {
        self.layouts.iter().position(|l| l.name() == name)
    }

    /// Resolve every layer and build its table
    ///
    /// Any configuration error aborts the whole compilation; no partial
    /// result is returned.
    pub fn compile(&self) -> Result<CompiledKeyboard, ConfigError> {
        let classifier =
            ScanCodeClassifier::new(&self.layouts, self.shift_marker, self.space_marker)?;
        let scan_roles = self.scancodes.classify(&classifier)?;
        log::debug!(
            "scan codes: {} chord keys, {} unused",
            scan_roles.iter().filter(|r| r.bit().is_some()).count(),
            scan_roles.iter().filter(|r| **r == ScanRole::Unused).count()
        );

        let mut layers: Vec<CompiledLayer> = Vec::with_capacity(self.layers.len());
        for spec in &self.layers {
            let (layout, resolved) = match &spec.source {
                LayerSource::Chords(map) => {
                    let layout = self.layout_index(map.layout().name()).ok_or_else(|| {
                        ConfigError::UnknownLayout {
                            layer: spec.name.clone(),
                            layout: map.layout().name().to_string(),
                        }
                    })?;
                    (layout, map.resolve()?)
                }
                LayerSource::Shifted { of } => {
                    let base = layers.iter().find(|l| &l.name == of).ok_or_else(|| {
                        ConfigError::UnknownShiftBase {
                            layer: spec.name.clone(),
                            base: of.clone(),
                        }
                    })?;
                    let derived = self.shift.derive(&spec.name, &base.resolved);
                    if derived.same_bytes(&base.resolved) {
                        log::warn!(
                            "layer '{}' is identical to '{}', shift has no effect",
                            spec.name,
                            base.name
                        );
                    }
                    (base.layout, derived)
                }
            };

            log::debug!(
                "layer '{}' over layout '{}': {} chords",
                spec.name,
                self.layouts[layout].name(),
                resolved.len()
            );
            let table = TableBuilder::from_resolved(&resolved);
            layers.push(CompiledLayer {
                name: spec.name.clone(),
                symbol: spec.symbol.clone(),
                description: spec.description.clone(),
                layout,
                resolved,
                table,
            });
        }

        Ok(CompiledKeyboard {
            name: self.name.clone(),
            layouts: self.layouts.clone(),
            scancodes: self.scancodes.clone(),
            scan_code_symbol: self.scan_code_symbol.clone(),
            scan_roles,
            shift_marker: self.shift_marker,
            space_marker: self.space_marker,
            layers,
        })
    }

    /// Mutable access to an explicit layer map, for building variants
    pub fn layer_map_mut(&mut self, name: &str) -> Option<&mut LayerMap> {
        self.layers
            .iter_mut()
            .find(|l| l.name == name)
            .and_then(|l| match &mut l.source {
                LayerSource::Chords(map) => Some(map),
                LayerSource::Shifted { .. } => None,
            })
    }
}

/// Bytes produced by one chord across every layer over its layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordLookup {
    pub chord: String,
    pub layout: String,
    pub mask: u8,
    /// (layer name, byte) in emission order
    pub bytes: Vec<(String, u8)>,
}

impl CompiledKeyboard {
    /// The layout whose bits the generated comment describes
    pub fn primary_layout(&self) -> Option<&KeyLayout> {
        self.layouts.first()
    }

    pub fn layer(&self, name: &str) -> Option<&CompiledLayer> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Look up a chord by its key symbols in any layout
    ///
    /// The first layout containing every symbol wins.
    pub fn lookup(&self, keys: &str) -> Result<ChordLookup, LayoutError> {
        let symbols: Vec<char> = keys.chars().collect();
        let (first, second) = match symbols.as_slice() {
            [a] => (*a, *a),
            [a, b] => (*a, *b),
            _ => {
                return Err(LayoutError::MalformedChord {
                    layer: "lookup".to_string(),
                    chord: keys.to_string(),
                })
            }
        };

        let (index, layout) = self
            .layouts
            .iter()
            .enumerate()
            .find(|(_, l)| l.contains(first) && l.contains(second))
            .ok_or_else(|| LayoutError::NoLayoutForChord(keys.to_string()))?;
        let chord = Chord::new(layout.require(first)?, layout.require(second)?);

        Ok(ChordLookup {
            chord: chord.to_string(),
            layout: layout.name().to_string(),
            mask: chord.mask(),
            bytes: self
                .layers
                .iter()
                .filter(|l| l.layout == index)
                .map(|l| (l.name.clone(), l.table.get(chord.mask())))
                .collect(),
        })
    }
}
