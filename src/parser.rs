//! Practice text markup.
//!
//! A practice text may carry inline annotations of the form `[surface](gloss)`.
//! The surface is what the typist has to type; the gloss is a hint shown while
//! the cursor sits inside that surface. Anything that does not form a complete
//! annotation stays literal text.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub display_text: String,
    pub gloss: Option<String>,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            display_text: text.into(),
            gloss: None,
        }
    }

    pub fn glossed(text: impl Into<String>, gloss: impl Into<String>) -> Self {
        Self {
            display_text: text.into(),
            gloss: Some(gloss.into()),
        }
    }

    /// Length of the display text in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.display_text.chars().count()
    }
}

/// Split `raw` into plain and glossed segments.
///
/// Surfaces must be non-empty and may not contain `[`, `]` or a newline;
/// glosses may not contain `)` or a newline. Brackets that do not open such an
/// annotation are kept as literal text and merged with the surrounding plain run.
pub fn parse(raw: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut plain = String::new();
    let mut rest = raw;

    while let Some(open) = rest.find('[') {
        plain.push_str(&rest[..open]);
        let candidate = &rest[open..];

        match match_annotation(candidate) {
            Some((surface, gloss, consumed)) => {
                if !plain.is_empty() {
                    segments.push(Segment::plain(std::mem::take(&mut plain)));
                }
                segments.push(Segment {
                    display_text: surface.to_string(),
                    gloss,
                });
                rest = &candidate[consumed..];
            }
            None => {
                plain.push('[');
                rest = &candidate[1..];
            }
        }
    }

    plain.push_str(rest);
    if !plain.is_empty() {
        segments.push(Segment::plain(plain));
    }

    segments
}

/// Try to read one annotation at the start of `s` (which begins with `[`).
/// Returns the surface, the optional gloss and the number of bytes consumed.
fn match_annotation(s: &str) -> Option<(&str, Option<String>, usize)> {
    let body = &s[1..];

    let close = body.find(['[', ']', '\n'])?;
    if close == 0 || body.as_bytes()[close] != b']' {
        return None;
    }
    let surface = &body[..close];

    let gloss_body = body[close + 1..].strip_prefix('(')?;
    let end = gloss_body.find([')', '\n'])?;
    if gloss_body.as_bytes()[end] != b')' {
        return None;
    }
    let gloss = &gloss_body[..end];

    // '[' + surface + "](" + gloss + ')'
    let consumed = 1 + close + 2 + end + 1;
    let gloss = (!gloss.is_empty()).then(|| gloss.to_string());

    Some((surface, gloss, consumed))
}

/// The de-annotated text the typist has to produce.
pub fn plain_text(segments: &[Segment]) -> String {
    segments.iter().map(|s| s.display_text.as_str()).collect()
}

/// Character ranges of every glossed segment, in order.
pub fn gloss_spans(segments: &[Segment]) -> Vec<(Range<usize>, String)> {
    let mut spans = Vec::new();
    let mut offset = 0;
    for segment in segments {
        let len = segment.char_len();
        if let Some(gloss) = &segment.gloss {
            spans.push((offset..offset + len, gloss.clone()));
        }
        offset += len;
    }
    spans
}
