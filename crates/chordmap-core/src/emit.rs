// Chordmap Emitter
// Renders compiled tables as C source stanzas

use std::fmt::Write;

use crate::compiler::{CompiledKeyboard, CompiledLayer};
use crate::scancode::ROW_WIDTH;

/// Table values per emitted row
pub const BYTES_PER_ROW: usize = 8;

/// Line that closes the generator block header in a C source file
pub const BEGIN_MARKER: &str = "]]]*/";

/// Line that closes the generated region
pub const END_MARKER: &str = "//[[[end]]]";

/// Errors that can occur while splicing generated text into a source file
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpliceError {
    #[error("no line ending in '{}' found", BEGIN_MARKER)]
    MissingBegin,

    #[error("no '{}' line found after the generator header", END_MARKER)]
    MissingEnd,
}

/// `//ASETNIOP bits` followed by each key of the primary layout and its bit
pub fn bits_stanza(compiled: &CompiledKeyboard) -> Vec<String> {
    let mut lines = vec![format!("//{} bits", compiled.name.to_uppercase())];
    if let Some(layout) = compiled.primary_layout() {
        let pairs: Vec<String> = layout
            .keys()
            .iter()
            .map(|k| format!("{}:{:02X}", k.symbol().to_ascii_uppercase(), k.bit()))
            .collect();
        lines.push(format!("//{}", pairs.join(" ")));
    }
    lines
}

/// The scan-code labels as a C string literal split into rows
pub fn scancode_stanza(compiled: &CompiledKeyboard) -> Vec<String> {
    let mut lines = vec![
        format!(
            "//Map scan codes to {} keys {}:Shift {}:Space",
            compiled.name, compiled.shift_marker, compiled.space_marker
        ),
        format!(
            "unsigned char {}[{}] =",
            compiled.scan_code_symbol,
            compiled.scancodes.len()
        ),
    ];
    for row in compiled.scancodes.rows(ROW_WIDTH) {
        lines.push(format!("    \"{}\"", escape_c(row)));
    }
    lines.push(";".to_string());
    lines
}

/// One layer table as a C byte array
pub fn layer_stanza(compiled: &CompiledKeyboard, layer: &CompiledLayer) -> Vec<String> {
    let bytes = layer.table.as_bytes();
    let mut lines = vec![
        format!(
            "//Map {} bit patterns to {} chars",
            compiled.name, layer.description
        ),
        format!("unsigned char {}[{}] = {{", layer.symbol, bytes.len()),
    ];
    for row in layer.table.rows(BYTES_PER_ROW) {
        let values: Vec<String> = row.iter().map(|b| format!("0x{:02X}", b)).collect();
        lines.push(format!("    {},", values.join(", ")));
    }
    lines.push("};".to_string());
    lines
}

/// Every stanza in order: bits, scan codes, then each layer
pub fn stanzas(compiled: &CompiledKeyboard) -> Vec<Vec<String>> {
    let mut stanzas = vec![bits_stanza(compiled), scancode_stanza(compiled)];
    for layer in &compiled.layers {
        stanzas.push(layer_stanza(compiled, layer));
    }
    stanzas
}

/// Render all stanzas separated by blank lines
pub fn render(compiled: &CompiledKeyboard) -> String {
    let mut out = String::new();
    for (i, stanza) in stanzas(compiled).iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for line in stanza {
            // writing to a String cannot fail
            let _ = writeln!(out, "{}", line);
        }
    }
    out
}

/// Replace the generated region of a C source file
///
/// Everything up to and including the line ending in [`BEGIN_MARKER`] and
/// everything from the [`END_MARKER`] line on is kept byte for byte.
pub fn splice(source: &str, generated: &str) -> Result<String, SpliceError> {
    let mut offset = 0;
    let mut body_start = None;
    for line in source.split_inclusive('\n') {
        offset += line.len();
        if body_start.is_none() {
            if line.trim_end().ends_with(BEGIN_MARKER) {
                body_start = Some(offset);
            }
        } else if line.starts_with(END_MARKER) {
            let start = body_start.unwrap_or(offset);
            let end = offset - line.len();
            let mut out = String::with_capacity(source.len() - (end - start) + generated.len());
            out.push_str(&source[..start]);
            out.push_str(generated);
            out.push_str(&source[end..]);
            return Ok(out);
        }
    }
    match body_start {
        None => Err(SpliceError::MissingBegin),
        Some(_) => Err(SpliceError::MissingEnd),
    }
}

fn escape_c(row: &str) -> String {
    row.chars()
        .flat_map(|c| match c {
            '"' | '\\' => vec!['\\', c],
            _ => vec![c],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::Keyboard;

    fn compiled() -> CompiledKeyboard {
        Keyboard::builtin().unwrap().compile().unwrap()
    }

    #[test]
    fn test_bits_stanza() {
        assert_eq!(
            bits_stanza(&compiled()),
            vec![
                "//ASETNIOP bits".to_string(),
                "//A:80 S:40 E:20 T:10 N:08 I:04 O:02 P:01".to_string(),
            ]
        );
    }

    #[test]
    fn test_scancode_stanza() {
        let lines = scancode_stanza(&compiled());
        assert_eq!(lines[0], "//Map scan codes to asetniop keys V:Shift N:Space");
        assert_eq!(lines[1], "unsigned char keys_map[256] =");
        assert_eq!(
            lines[2],
            "    \"  1234567890    aset  niop    aset  niop  V VVVV NNNN V  N      \""
        );
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[6], ";");
    }

    #[test]
    fn test_layer_stanza_format() {
        let compiled = compiled();
        let lines = layer_stanza(&compiled, &compiled.layers[0]);
        assert_eq!(lines[0], "//Map asetniop bit patterns to lower-case chars");
        assert_eq!(lines[1], "unsigned char lower_letters_map[256] = {");
        assert_eq!(
            lines[2],
            "    0x00, 0x70, 0x6F, 0x3B, 0x69, 0x6B, 0x6C, 0x00,"
        );
        assert_eq!(lines.len(), 2 + 32 + 1);
        assert_eq!(lines[34], "};");
    }

    #[test]
    fn test_render_separates_stanzas() {
        let text = render(&compiled());
        assert!(text.starts_with("//ASETNIOP bits\n//A:80"));
        assert!(text.contains("P:01\n\n//Map scan codes"));
        assert!(text.contains("};\n\n//Map asetniop bit patterns to upper-case chars"));
        assert!(text.ends_with("};\n"));
        assert_eq!(text.matches("\n\n").count(), 5);
    }

    #[test]
    fn test_escape_c() {
        assert_eq!(escape_c(r#"a"b\"#), r#"a\"b\\"#);
    }

    #[test]
    fn test_splice_replaces_generated_region() {
        let source = "#include <stdio.h>\n/*[[[cog\ncog.outl()\n]]]*/\nold line\n//[[[end]]]\nint x;\n";
        let spliced = splice(source, "new 1\nnew 2\n").unwrap();
        assert_eq!(
            spliced,
            "#include <stdio.h>\n/*[[[cog\ncog.outl()\n]]]*/\nnew 1\nnew 2\n//[[[end]]]\nint x;\n"
        );
    }

    #[test]
    fn test_splice_missing_markers() {
        assert_eq!(splice("int x;\n", "y"), Err(SpliceError::MissingBegin));
        assert_eq!(
            splice("]]]*/\nint x;\n", "y"),
            Err(SpliceError::MissingEnd)
        );
    }
}
