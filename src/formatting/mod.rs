// Formatting model - capture and reapply bold/italic/underline ranges
// Works against any editing surface that exposes line.column addressed tags

mod buffer;

pub use buffer::TextBuffer;

use crate::error::{NotesError, NotesResult};
use crate::models::{FormatRange, FormatTag, TextPos};

/// Text-editing collaborator the formatting model reads from and writes to.
///
/// Implementations own bounds handling: positions beyond the content must be
/// clamped or ignored, never rejected.
pub trait EditingSurface {
    /// Contiguous spans currently carrying `tag`, in document order
    fn tagRanges(&self, tag: FormatTag) -> Vec<(TextPos, TextPos)>;

    fn addTag(&mut self, tag: FormatTag, start: TextPos, end: TextPos);

    fn removeTag(&mut self, tag: FormatTag, start: TextPos, end: TextPos);

    /// Tags on the character that starts at `pos`
    fn tagsAt(&self, pos: TextPos) -> Vec<FormatTag>;

    /// Active selection, if any
    fn selection(&self) -> Option<(TextPos, TextPos)>;
}

/// What a toggle did to the selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Selection clamped to an empty span, nothing was tagged
    Unchanged,
}

/// Every decorated span, grouped in bold, italic, underline order
pub fn captureFormatting<S: EditingSurface + ?Sized>(surface: &S) -> Vec<FormatRange> {
    let ranges: Vec<FormatRange> = FormatTag::ALL
        .into_iter()
        .flat_map(|tag| {
            surface
                .tagRanges(tag)
                .into_iter()
                .map(move |(start, end)| FormatRange::new(tag, start, end))
        })
        .collect();
    tracing::debug!("[captureFormatting] {} ranges", ranges.len());
    ranges
}

/// Marks each range independently; no bounds validation here
pub fn applyFormatting<S: EditingSurface + ?Sized>(surface: &mut S, ranges: &[FormatRange]) {
    for range in ranges {
        surface.addTag(range.tag, range.start, range.end);
    }
    tracing::debug!("[applyFormatting] applied {} ranges", ranges.len());
}

/// Flips `tag` over the selection.
///
/// Whether the tag is "already active" is decided by the character at the
/// selection start only; when it is, the tag is cleared from the whole
/// selection, otherwise it is added to the whole selection. A selection that
/// the surface clamps to nothing leaves the text as it was.
pub fn toggleFormat<S: EditingSurface + ?Sized>(
    surface: &mut S,
    tag: FormatTag,
    selectionStart: Option<TextPos>,
    selectionEnd: Option<TextPos>,
) -> NotesResult<ToggleOutcome> {
    let (start, end) = match (selectionStart, selectionEnd) {
        (Some(start), Some(end)) if start != end => (start.min(end), start.max(end)),
        _ => return Err(NotesError::NoSelection),
    };

    if surface.tagsAt(start).contains(&tag) {
        surface.removeTag(tag, start, end);
        tracing::debug!("[toggleFormat] removed {} from {}-{}", tag, start, end);
        Ok(ToggleOutcome::Removed)
    } else {
        surface.addTag(tag, start, end);
        if !surface.tagsAt(start).contains(&tag) {
            tracing::debug!("[toggleFormat] {}-{} is outside the content", start, end);
            return Ok(ToggleOutcome::Unchanged);
        }
        tracing::debug!("[toggleFormat] added {} to {}-{}", tag, start, end);
        Ok(ToggleOutcome::Added)
    }
}

/// Toggle using the surface's own selection
pub fn toggleSelection<S: EditingSurface + ?Sized>(surface: &mut S, tag: FormatTag) -> NotesResult<ToggleOutcome> {
    let selection = surface.selection();
    toggleFormat(surface, tag, selection.map(|(s, _)| s), selection.map(|(_, e)| e))
}
