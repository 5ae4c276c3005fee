//! CleWin CIF serialization and template splicing.
//!
//! Only the handful of CIF statements hexdot emits are understood here:
//! a layer switch `L <name>;`, a round flash `R <diameter> <x> <y>;`, and
//! the `DF;` line that closes a symbol definition. Everything else in a
//! template is carried through as opaque text.

use std::fmt::Write as _;
use std::mem;

use hexdot_core::batch::ArrayBatch;
use hexdot_core::geometry::Feature;

/// Line that closes a symbol definition; new geometry goes in front of the first one.
pub const MARKER_LINE: &str = "DF;";

/// [`MARKER_LINE`] as hexdot writes it.
pub const MARKER: &str = "DF;\n";

/// CIF units per micrometer (1 unit = 1 nm).
pub const NM_PER_UM: f64 = 1000.0;

/// Layer used when the caller does not name one.
pub const DEFAULT_LAYER: &str = "L0";

/// Minimal document as written by CleWin 4.1 for an empty design.
pub const BLANK_TEMPLATE: &str = "(CIF written by CleWin 4.1);\n\
(1 unit = 0.001 micron);\n\
(Layer names:);\n\
L L0; (CleWin: 0 0 Layer 0/0f808000 0f808000);\n\
(Top level:);\n\
DS1 1 10;\n\
9 MainSymbol;\n\
DF;\n\
C 1;\n\
E";

/// Convert µm to integer CIF units, rounding half away from zero.
pub fn quantize(value_um: f64) -> i64 {
    (value_um * NM_PER_UM).round() as i64
}

fn push_layer_header(out: &mut String, layer: &str) {
    // Writing into a String cannot fail.
    let _ = writeln!(out, "L {};", layer);
}

fn push_feature(out: &mut String, feature: &Feature) {
    let _ = writeln!(
        out,
        "R {} {} {};",
        quantize(feature.diameter),
        quantize(feature.center.x),
        quantize(feature.center.y)
    );
}

/// Serialize features as a layer block: one `L` line, then one `R` line per dot.
pub fn layer_block<'a, I>(layer: &str, features: I) -> String
where
    I: IntoIterator<Item = &'a Feature>,
{
    let mut out = String::new();
    push_layer_header(&mut out, layer);
    for feature in features {
        push_feature(&mut out, feature);
    }
    out
}

/// One piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// A `DF;` line, with its original line ending.
    Marker(String),
}

/// A template split on `DF;` lines, so that rendering reproduces the input exactly.
///
/// Marker lines may end in `\n` or `\r\n`. Inserted text follows the line
/// ending of the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CifDocument {
    segments: Vec<Segment>,
    line_ending: &'static str,
}

fn is_marker_line(line: &str) -> bool {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        == Some(MARKER_LINE)
}

impl CifDocument {
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut pending = String::new();
        for line in text.split_inclusive('\n') {
            if is_marker_line(line) {
                if !pending.is_empty() {
                    segments.push(Segment::Text(mem::take(&mut pending)));
                }
                segments.push(Segment::Marker(line.to_string()));
            } else {
                pending.push_str(line);
            }
        }
        if !pending.is_empty() {
            segments.push(Segment::Text(pending));
        }

        let crlf = match segments.iter().find_map(|s| match s {
            Segment::Marker(m) => Some(m),
            Segment::Text(_) => None,
        }) {
            Some(marker) => marker.ends_with("\r\n"),
            None => text.contains("\r\n"),
        };
        Self {
            segments,
            line_ending: if crlf { "\r\n" } else { "\n" },
        }
    }

    pub fn blank() -> Self {
        Self::parse(BLANK_TEMPLATE)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// `"\r\n"` for CRLF templates, `"\n"` otherwise.
    pub fn line_ending(&self) -> &'static str {
        self.line_ending
    }

    pub fn marker_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Marker(_)))
            .count()
    }

    /// Insert `block` right before the first marker.
    ///
    /// A document without any marker gets the block appended on a new line,
    /// followed by a fresh marker so the result still closes the symbol.
    pub fn insert_before_first_marker(&mut self, block: String) {
        let block = if self.line_ending == "\n" {
            block
        } else {
            block.replace('\n', self.line_ending)
        };
        match self
            .segments
            .iter()
            .position(|s| matches!(s, Segment::Marker(_)))
        {
            Some(index) => self.segments.insert(index, Segment::Text(block)),
            None => {
                log::warn!(
                    "Template has no '{}' line; appending layer block at end",
                    MARKER_LINE
                );
                if let Some(Segment::Text(last)) = self.segments.last() {
                    if !last.ends_with('\n') {
                        self.segments
                            .push(Segment::Text(self.line_ending.to_string()));
                    }
                }
                self.segments.push(Segment::Text(block));
                self.segments
                    .push(Segment::Marker(format!("{}{}", MARKER_LINE, self.line_ending)));
            }
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) | Segment::Marker(text) => out.push_str(text),
            }
        }
        out
    }
}

/// Insert `features` as a block on `layer` into `document`.
pub fn splice(document: &str, layer: &str, features: &[Feature]) -> String {
    let mut doc = CifDocument::parse(document);
    doc.insert_before_first_marker(layer_block(layer, features));
    doc.render()
}

/// Insert every array of `batch` as a single block on `layer`.
pub fn splice_batch(document: &str, layer: &str, batch: &ArrayBatch) -> String {
    let mut doc = CifDocument::parse(document);
    doc.insert_before_first_marker(layer_block(layer, batch.features()));
    doc.render()
}
