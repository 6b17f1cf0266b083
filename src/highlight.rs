//! Splits text into plain and matched display segments.

use crate::search::MatchSet;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SegmentKind {
    Plain,
    /// Position of the match in its set, and whether the cursor is on it
    Match { index: usize, active: bool },
}

/// A run of text borrowed from the document, ready for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub kind: SegmentKind,
}

impl<'a> Segment<'a> {
    fn plain(text: &'a str) -> Self {
        Self {
            text,
            kind: SegmentKind::Plain,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self.kind, SegmentKind::Match { .. })
    }

    pub fn is_active(&self) -> bool {
        matches!(self.kind, SegmentKind::Match { active: true, .. })
    }
}

/// Cut `text` at every match boundary.
///
/// Concatenating the returned segments reproduces `text` exactly. Matches
/// that do not fit the text (out of bounds, overlapping an earlier match,
/// or splitting a character) are left as plain text, and a cursor outside
/// the set marks nothing active.
pub fn render<'a>(text: &'a str, matches: &MatchSet, cursor: Option<usize>) -> Vec<Segment<'a>> {
    let mut segments = Vec::with_capacity(matches.len() * 2 + 1);
    let mut pos = 0;

    for (index, m) in matches.iter().enumerate() {
        if m.len == 0 || m.start < pos {
            continue;
        }
        let Some(end) = m.start.checked_add(m.len) else {
            continue;
        };
        let (Some(before), Some(matched)) = (text.get(pos..m.start), text.get(m.start..end)) else {
            continue;
        };

        if !before.is_empty() {
            segments.push(Segment::plain(before));
        }
        segments.push(Segment {
            text: matched,
            kind: SegmentKind::Match {
                index,
                active: cursor == Some(index),
            },
        });
        pos = end;
    }

    if pos < text.len() {
        segments.push(Segment::plain(&text[pos..]));
    }
    segments
}
