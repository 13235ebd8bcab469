// Note commands - the operations a presentation layer calls
// Create/update: note file, then in-memory index, then index file.
// Delete: note file, then in-memory index, then index file.
// A failed step stops the sequence; nothing is rolled back.

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

use super::common::{newId, now};
use crate::error::{NotesError, NotesResult, ValidationError};
use crate::filter::{RecencyFilter, filterByRecency};
use crate::formatting::{self, EditingSurface, TextBuffer, ToggleOutcome};
use crate::models::{DEFAULT_TITLE, FormatRange, FormatTag, IndexEntry, Note, Settings, Timestamp};
use crate::storage::{ConsistencyReport, NoteIndex, Storage, globalConfigDir};

// ============================================
// APPLICATION STATE
// ============================================

/// Storage manager plus the in-memory index it is kept in sync with
pub struct NotesApp {
    storage: Storage,
    index: RwLock<NoteIndex>,
    indexLoadError: RwLock<Option<String>>,
}

pub type AppState = Arc<NotesApp>;

impl NotesApp {
    /// Opens <baseDir>/notes/, creating it if needed.
    ///
    /// An unparsable index file does not fail the open: the app starts with an
    /// empty index and keeps the error text for `indexLoadError`.
    pub fn open(baseDir: impl Into<PathBuf>) -> NotesResult<Self> {
        let storage = Storage::new(baseDir)?;
        let (entries, loadError) = match storage.loadIndex() {
            Ok(entries) => (entries, None),
            Err(e) => {
                tracing::warn!(error = %e, "[NotesApp::open] index unreadable, starting with no notes");
                (Vec::new(), Some(e.to_string()))
            }
        };
        tracing::info!("[NotesApp::open] Loaded {} notes from index", entries.len());

        Ok(Self {
            storage,
            index: RwLock::new(NoteIndex::new(entries)),
            indexLoadError: RwLock::new(loadError),
        })
    }

    /// Opens the base directory named by settings, else ~/.notekeeper
    pub fn fromSettings(settings: &Settings) -> NotesResult<Self> {
        Self::open(settings.resolveBaseDir(globalConfigDir()?))
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn indexSnapshot(&self) -> NoteIndex {
        self.index.read().clone()
    }

    /// Set when the index file existed but could not be parsed
    pub fn indexLoadError(&self) -> Option<String> {
        self.indexLoadError.read().clone()
    }
}

// ============================================
// NOTE INFO
// ============================================

/// Row for the notes list, with the created date pre-rendered
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct NoteInfo {
    pub id: String,
    pub title: String,
    pub created: Timestamp,
    pub modified: Timestamp,
    pub createdLabel: String,
}

impl NoteInfo {
    pub fn fromEntry(entry: &IndexEntry, dateFormat: &str) -> Self {
        Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            created: entry.created,
            modified: entry.modified,
            createdLabel: entry.created.display(dateFormat),
        }
    }
}

// ============================================
// COMMANDS
// ============================================

/// Allocates an id for a new note; nothing is persisted
pub fn createNote(app: &NotesApp) -> String {
    createNoteAt(app, now())
}

pub fn createNoteAt(app: &NotesApp, at: Timestamp) -> String {
    let id = newId(&app.index.read(), at);
    tracing::debug!("[createNote] allocated id {}", id);
    id
}

/// Full record for one note; Ok(None) when its file is missing
pub fn openNote(app: &NotesApp, id: &str) -> NotesResult<Option<Note>> {
    tracing::debug!("[openNote] Called with id: {}", id);
    app.storage.loadNote(id)
}

/// Loads a note into an editing surface: content first, then its formatting
pub fn openNoteInEditor(app: &NotesApp, id: &str, editor: &mut TextBuffer) -> NotesResult<Option<Note>> {
    let note = openNote(app, id)?;
    if let Some(note) = &note {
        editor.setContent(&note.content);
        formatting::applyFormatting(editor, &note.formatting);
    }
    Ok(note)
}

/// Index entries created within the last `days` days (all when None), newest first
pub fn listNotes(app: &NotesApp, days: Option<u32>) -> Vec<IndexEntry> {
    let entries = filterByRecency(app.index.read().entries(), days, now());
    tracing::debug!("[listNotes] days: {:?}, {} notes", days, entries.len());
    entries
}

pub fn listNotesWith(app: &NotesApp, filter: RecencyFilter) -> Vec<IndexEntry> {
    listNotes(app, filter.days())
}

pub fn listNoteInfos(app: &NotesApp, filter: RecencyFilter, dateFormat: &str) -> Vec<NoteInfo> {
    listNotesWith(app, filter)
        .iter()
        .map(|e| NoteInfo::fromEntry(e, dateFormat))
        .collect()
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SaveNoteInput {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub formatting: Vec<FormatRange>,
    pub isNew: bool,
}

pub fn saveNote(app: &NotesApp, input: SaveNoteInput) -> NotesResult<Note> {
    saveNoteAt(app, input, now())
}

/// Validates, writes the note file, then the index.
///
/// `created` comes from the existing note file, else the existing index entry,
/// else `at`; `modified` is always `at`.
pub fn saveNoteAt(app: &NotesApp, input: SaveNoteInput, at: Timestamp) -> NotesResult<Note> {
    tracing::debug!("[saveNote] Called with id: {}, isNew: {}", input.id, input.isNew);

    if input.content.trim().is_empty() {
        tracing::warn!("[saveNote] rejected empty content for {}", input.id);
        return Err(ValidationError::EmptyContent.into());
    }

    let title = match input.title.trim() {
        "" => DEFAULT_TITLE.to_string(),
        t => t.to_string(),
    };

    let created = match previousCreated(app, &input.id)? {
        Some(created) => {
            if input.isNew {
                tracing::warn!("[saveNote] {} already exists, keeping its created time", input.id);
            }
            created
        }
        None => at,
    };

    let note = Note {
        id: input.id,
        title,
        content: input.content,
        formatting: input.formatting,
        created,
        modified: at,
    };

    app.storage.saveNote(&note)?;

    let mut index = app.index.write();
    index.upsert(note.indexEntry());
    app.storage.saveIndex(index.entries())?;

    tracing::info!("[saveNote] SUCCESS {} ({} formatting ranges)", note.id, note.formatting.len());
    Ok(note)
}

/// Saves whatever the editor currently shows
pub fn saveFromEditor(app: &NotesApp, id: &str, title: &str, editor: &TextBuffer, isNew: bool) -> NotesResult<Note> {
    saveNote(
        app,
        SaveNoteInput {
            id: id.to_string(),
            title: title.to_string(),
            content: editor.content(),
            formatting: formatting::captureFormatting(editor),
            isNew,
        },
    )
}

fn previousCreated(app: &NotesApp, id: &str) -> NotesResult<Option<Timestamp>> {
    let fromIndex = || app.index.read().get(id).map(|e| e.created);
    match app.storage.loadNote(id) {
        Ok(Some(existing)) => Ok(Some(existing.created)),
        Ok(None) => Ok(fromIndex()),
        Err(NotesError::InvalidId(id)) => Err(NotesError::InvalidId(id)),
        Err(e) => {
            tracing::warn!(error = %e, "[saveNote] existing note unreadable, using index for created time");
            Ok(fromIndex())
        }
    }
}

/// Removes the note file and its index entry; deleting a missing note succeeds
pub fn deleteNote(app: &NotesApp, id: &str) -> NotesResult<()> {
    tracing::debug!("[deleteNote] Called with id: {}", id);

    app.storage.deleteNote(id)?;

    let mut index = app.index.write();
    index.remove(id);
    app.storage.saveIndex(index.entries())?;

    tracing::info!("[deleteNote] SUCCESS {}", id);
    Ok(())
}

/// Toggle a tag over the editor's current selection
pub fn toggleFormat<S: EditingSurface + ?Sized>(editor: &mut S, tag: FormatTag) -> NotesResult<ToggleOutcome> {
    formatting::toggleSelection(editor, tag)
}

pub fn captureFormatting<S: EditingSurface + ?Sized>(editor: &S) -> Vec<FormatRange> {
    formatting::captureFormatting(editor)
}

// ============================================
// MAINTENANCE
// ============================================

/// Rebuilds the index from every readable note file and saves it
pub fn rebuildIndex(app: &NotesApp) -> NotesResult<usize> {
    let mut entries: Vec<IndexEntry> = Vec::new();
    for id in app.storage.scanNoteIds()? {
        match app.storage.loadNote(&id) {
            Ok(Some(note)) => entries.push(note.indexEntry()),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "[rebuildIndex] skipping unreadable note {}", id),
        }
    }
    entries.sort_by(|a, b| a.created.cmp(&b.created));

    let mut index = app.index.write();
    app.storage.saveIndex(&entries)?;
    let count = entries.len();
    *index = NoteIndex::new(entries);
    *app.indexLoadError.write() = None;

    tracing::info!("[rebuildIndex] index rebuilt with {} notes", count);
    Ok(count)
}

pub fn consistencyReport(app: &NotesApp) -> NotesResult<ConsistencyReport> {
    app.storage.checkConsistency(app.index.read().entries())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TextPos;
    use chrono::TimeDelta;
    use std::fs;

    fn tempApp() -> (tempfile::TempDir, NotesApp) {
        let dir = tempfile::tempdir().expect("temp base dir");
        let app = NotesApp::open(dir.path()).expect("open app");
        (dir, app)
    }

    fn ts(raw: &str) -> Timestamp {
        Timestamp::parse(raw).unwrap()
    }

    fn input(id: &str, title: &str, content: &str, isNew: bool) -> SaveNoteInput {
        SaveNoteInput {
            id: id.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            formatting: Vec::new(),
            isNew,
        }
    }

    #[test]
    fn test_groceries_scenario() {
        let (_dir, app) = tempApp();
        let t0 = ts("2024-01-01T12:00:00");
        let id = createNoteAt(&app, t0);
        assert_eq!(id, "20240101_120000");
        assert!(openNote(&app, &id).unwrap().is_none());

        saveNoteAt(&app, input(&id, "Groceries", "milk, eggs", true), t0).unwrap();
        let loaded = openNote(&app, &id).unwrap().unwrap();
        assert_eq!(loaded.title, "Groceries");
        assert_eq!(loaded.content, "milk, eggs");
        assert!(loaded.formatting.is_empty());
        assert_eq!(loaded.created, loaded.modified);

        let t1 = ts("2024-01-01T12:05:00.123000");
        saveNoteAt(&app, input(&id, "Groceries", "milk, eggs, bread", false), t1).unwrap();
        let updated = openNote(&app, &id).unwrap().unwrap();
        assert_eq!(updated.created, t0);
        assert_eq!(updated.modified, t1);
        assert_eq!(updated.content, "milk, eggs, bread");

        let index = app.storage().loadIndex().unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index[0].title, "Groceries");
        assert_eq!(index[0].created, t0);
        assert_eq!(index[0].modified, t1);
    }

    #[test]
    fn test_empty_content_is_rejected_without_writes() {
        let (_dir, app) = tempApp();
        for content in ["", "   \n\t "] {
            let err = saveNote(&app, input("20240101_120000", "t", content, true)).unwrap_err();
            assert!(matches!(err, NotesError::Validation(ValidationError::EmptyContent)));
        }
        assert!(!app.storage().notePath("20240101_120000").unwrap().exists());
        assert!(!app.storage().indexPath().exists());
        assert!(app.indexSnapshot().isEmpty());
    }

    #[test]
    fn test_blank_title_defaults() {
        let (_dir, app) = tempApp();
        let note = saveNote(&app, input("20240101_120000", "  ", "body", true)).unwrap();
        assert_eq!(note.title, DEFAULT_TITLE);
        let note = saveNote(&app, input("20240101_120000", "  Trimmed ", "body", false)).unwrap();
        assert_eq!(note.title, "Trimmed");
    }

    #[test]
    fn test_update_without_index_entry_still_indexes() {
        let (_dir, app) = tempApp();
        saveNote(&app, input("20240101_120000", "t", "body", false)).unwrap();
        assert_eq!(app.storage().loadIndex().unwrap().len(), 1);
    }

    #[test]
    fn test_created_falls_back_to_index_when_file_is_corrupt() {
        let (_dir, app) = tempApp();
        let t0 = ts("2024-01-01T12:00:00");
        saveNoteAt(&app, input("20240101_120000", "t", "body", true), t0).unwrap();
        fs::write(app.storage().notePath("20240101_120000").unwrap(), "{ broken").unwrap();

        let later = ts("2024-02-01T08:00:00");
        let note = saveNoteAt(&app, input("20240101_120000", "t", "body 2", false), later).unwrap();
        assert_eq!(note.created, t0);
    }

    #[test]
    fn test_delete_twice_is_fine() {
        let (_dir, app) = tempApp();
        saveNote(&app, input("20240101_120000", "t", "body", true)).unwrap();
        deleteNote(&app, "20240101_120000").unwrap();
        let afterFirst = app.storage().loadIndex().unwrap();
        deleteNote(&app, "20240101_120000").unwrap();
        assert_eq!(app.storage().loadIndex().unwrap(), afterFirst);
        assert!(afterFirst.is_empty());
        assert!(openNote(&app, "20240101_120000").unwrap().is_none());
    }

    #[test]
    fn test_create_note_avoids_indexed_ids() {
        let (_dir, app) = tempApp();
        let t0 = ts("2024-01-01T12:00:00");
        let first = createNoteAt(&app, t0);
        saveNoteAt(&app, input(&first, "a", "a", true), t0).unwrap();
        let second = createNoteAt(&app, t0);
        assert_eq!(second, "20240101_120001");
    }

    #[test]
    fn test_list_filters_by_created() {
        let (_dir, app) = tempApp();
        let now = Timestamp::now();
        for (id, days) in [("a", 1), ("b", 10), ("c", 40)] {
            let at = now.checkedSub(TimeDelta::try_days(days).unwrap()).unwrap();
            saveNoteAt(&app, input(id, id, "body", true), at).unwrap();
        }
        let ids: Vec<String> = listNotes(&app, Some(30)).into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(listNotesWith(&app, RecencyFilter::All).len(), 3);

        let infos = listNoteInfos(&app, RecencyFilter::lastWeek(), "%Y");
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].createdLabel.len(), 4);
    }

    #[test]
    fn test_editor_round_trip() {
        let (_dir, app) = tempApp();
        let mut editor = TextBuffer::new("hello world");
        editor.select(TextPos::new(1, 0), TextPos::new(1, 4));
        assert_eq!(toggleFormat(&mut editor, FormatTag::Bold).unwrap(), ToggleOutcome::Added);
        saveFromEditor(&app, "20240101_120000", "Hello", &editor, true).unwrap();

        let mut reopened = TextBuffer::default();
        let note = openNoteInEditor(&app, "20240101_120000", &mut reopened).unwrap().unwrap();
        assert_eq!(note.formatting, vec![FormatRange::new(FormatTag::Bold, TextPos::new(1, 0), TextPos::new(1, 4))]);
        assert_eq!(captureFormatting(&reopened), captureFormatting(&editor));
        assert_eq!(reopened.content(), "hello world");
    }

    #[test]
    fn test_toggle_without_selection_reports_it() {
        let mut editor = TextBuffer::new("hello");
        assert!(matches!(toggleFormat(&mut editor, FormatTag::Underline), Err(NotesError::NoSelection)));
    }

    #[test]
    fn test_corrupt_index_opens_degraded_and_rebuilds() {
        let dir = tempfile::tempdir().unwrap();
        {
            let app = NotesApp::open(dir.path()).unwrap();
            saveNote(&app, input("20240101_120000", "one", "body", true)).unwrap();
            saveNote(&app, input("20240102_120000", "two", "body", true)).unwrap();
        }
        fs::write(dir.path().join("notes").join("notes_index.json"), "not json").unwrap();

        let app = NotesApp::open(dir.path()).unwrap();
        assert!(listNotes(&app, None).is_empty());
        assert!(app.indexLoadError().unwrap().starts_with("STORAGE_READ:"));

        let report = consistencyReport(&app).unwrap();
        assert_eq!(report.orphanFiles.len(), 2);

        assert_eq!(rebuildIndex(&app).unwrap(), 2);
        assert!(app.indexLoadError().is_none());
        assert_eq!(listNotes(&app, None).len(), 2);
        assert!(consistencyReport(&app).unwrap().isConsistent());
    }

    #[test]
    fn test_list_infos_survive_bad_date_format() {
        let (_dir, app) = tempApp();
        saveNoteAt(&app, input("20240101_120000", "t", "body", true), ts("2024-01-01T12:00:00")).unwrap();
        let infos = listNoteInfos(&app, RecencyFilter::All, "%Q");
        assert_eq!(infos[0].createdLabel, "2024-01-01T12:00:00");
    }

    #[test]
    fn test_note_write_failure_skips_index_update() {
        let (_dir, app) = tempApp();
        let blocker = app.storage().notesDir().join("20240101_120000.json.tmp");
        fs::create_dir(&blocker).unwrap();

        let err = saveNote(&app, input("20240101_120000", "t", "body", true)).unwrap_err();
        assert!(err.isStorageWrite());
        assert!(!app.indexSnapshot().contains("20240101_120000"));
        assert!(!app.storage().indexPath().exists());
        assert!(!app.storage().notePath("20240101_120000").unwrap().exists());
    }

    #[test]
    fn test_delete_with_index_write_failure_leaves_stale_entry() {
        let (_dir, app) = tempApp();
        saveNote(&app, input("20240101_120000", "t", "body", true)).unwrap();
        let blocker = app.storage().notesDir().join("notes_index.json.tmp");
        fs::create_dir(&blocker).unwrap();

        let err = deleteNote(&app, "20240101_120000").unwrap_err();
        assert!(err.isStorageWrite());

        // known gap: the file is gone but the on-disk index still lists it
        assert!(!app.storage().notePath("20240101_120000").unwrap().exists());
        let onDisk = app.storage().loadIndex().unwrap();
        assert!(onDisk.iter().any(|e| e.id == "20240101_120000"));
        assert!(!app.indexSnapshot().contains("20240101_120000"));
        assert_eq!(consistencyReport(&app).unwrap().danglingEntries, Vec::<String>::new());
    }

    #[test]
    fn test_index_write_failure_leaves_note_file_behind() {
        let (_dir, app) = tempApp();
        let blocker = app.storage().notesDir().join("notes_index.json.tmp");
        fs::create_dir(&blocker).unwrap();

        let err = saveNote(&app, input("20240101_120000", "t", "body", true)).unwrap_err();
        assert!(err.isStorageWrite());

        // known gap: the note file exists while the index file was never written
        assert!(app.storage().notePath("20240101_120000").unwrap().exists());
        assert!(!app.storage().indexPath().exists());
        assert!(app.indexSnapshot().contains("20240101_120000"));
    }
}
