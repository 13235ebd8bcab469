// Headless editing surface
// Spans are kept as character offsets; line.column is only used at the trait edge

use std::collections::BTreeMap;

use super::EditingSurface;
use crate::models::{FormatTag, TextPos};

/// Half-open character range [start, end)
type Span = (usize, usize);

#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    chars: Vec<char>,
    lineStarts: Vec<usize>,
    spans: BTreeMap<FormatTag, Vec<Span>>,
    selection: Option<Span>,
}

impl TextBuffer {
    pub fn new(content: &str) -> Self {
        let mut buffer = Self::default();
        buffer.setContent(content);
        buffer
    }

    /// Replaces the text and drops all tags and the selection
    pub fn setContent(&mut self, content: &str) {
        self.chars = content.chars().collect();
        self.lineStarts = std::iter::once(0)
            .chain(self.chars.iter().enumerate().filter(|(_, c)| **c == '\n').map(|(i, _)| i + 1))
            .collect();
        self.spans.clear();
        self.selection = None;
    }

    pub fn content(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn charCount(&self) -> usize {
        self.chars.len()
    }

    /// Clamps: column past the line end lands on the line end, line past the last lands on content end
    pub fn offsetOf(&self, pos: TextPos) -> usize {
        let lineIdx = pos.line.saturating_sub(1);
        let Some(&lineStart) = self.lineStarts.get(lineIdx) else {
            return self.chars.len();
        };
        let lineEnd = self
            .lineStarts
            .get(lineIdx + 1)
            .map(|next| next - 1)
            .unwrap_or(self.chars.len());
        lineStart.saturating_add(pos.column).min(lineEnd)
    }

    pub fn posOf(&self, offset: usize) -> TextPos {
        let offset = offset.min(self.chars.len());
        let lineIdx = self.lineStarts.partition_point(|start| *start <= offset).saturating_sub(1);
        TextPos::new(lineIdx + 1, offset - self.lineStarts[lineIdx])
    }

    /// Selects [start, end); an empty range clears the selection
    pub fn select(&mut self, start: TextPos, end: TextPos) {
        let (a, b) = (self.offsetOf(start), self.offsetOf(end));
        let (a, b) = if a <= b { (a, b) } else { (b, a) };
        self.selection = (a < b).then_some((a, b));
    }

    pub fn clearSelection(&mut self) {
        self.selection = None;
    }

    /// Text covered by a tag, one string per span
    pub fn taggedText(&self, tag: FormatTag) -> Vec<String> {
        self.spansOf(tag)
            .iter()
            .map(|(s, e)| self.chars[*s..*e].iter().collect())
            .collect()
    }

    fn spansOf(&self, tag: FormatTag) -> &[Span] {
        self.spans.get(&tag).map(Vec::as_slice).unwrap_or(&[])
    }

    fn insertSpan(&mut self, tag: FormatTag, (start, end): Span) {
        let spans = self.spans.entry(tag).or_default();
        let (mut start, mut end) = (start, end);
        // absorb every span that overlaps or touches
        spans.retain(|(s, e)| {
            if *s <= end && *e >= start {
                start = start.min(*s);
                end = end.max(*e);
                false
            } else {
                true
            }
        });
        let at = spans.partition_point(|(s, _)| *s < start);
        spans.insert(at, (start, end));
    }

    fn subtractSpan(&mut self, tag: FormatTag, (start, end): Span) {
        let Some(spans) = self.spans.get_mut(&tag) else {
            return;
        };
        let mut kept = Vec::with_capacity(spans.len() + 1);
        for &(s, e) in spans.iter() {
            if e <= start || s >= end {
                kept.push((s, e));
                continue;
            }
            if s < start {
                kept.push((s, start));
            }
            if e > end {
                kept.push((end, e));
            }
        }
        *spans = kept;
    }

    fn clampedSpan(&self, start: TextPos, end: TextPos) -> Option<Span> {
        let (s, e) = (self.offsetOf(start), self.offsetOf(end));
        (s < e).then_some((s, e))
    }
}

impl EditingSurface for TextBuffer {
    fn tagRanges(&self, tag: FormatTag) -> Vec<(TextPos, TextPos)> {
        self.spansOf(tag)
            .iter()
            .map(|(s, e)| (self.posOf(*s), self.posOf(*e)))
            .collect()
    }

    fn addTag(&mut self, tag: FormatTag, start: TextPos, end: TextPos) {
        if let Some(span) = self.clampedSpan(start, end) {
            self.insertSpan(tag, span);
        }
    }

    fn removeTag(&mut self, tag: FormatTag, start: TextPos, end: TextPos) {
        if let Some(span) = self.clampedSpan(start, end) {
            self.subtractSpan(tag, span);
        }
    }

    fn tagsAt(&self, pos: TextPos) -> Vec<FormatTag> {
        let offset = self.offsetOf(pos);
        FormatTag::ALL
            .into_iter()
            .filter(|tag| self.spansOf(*tag).iter().any(|(s, e)| *s <= offset && offset < *e))
            .collect()
    }

    fn selection(&self) -> Option<(TextPos, TextPos)> {
        self.selection.map(|(s, e)| (self.posOf(s), self.posOf(e)))
    }
}
