// Filesystem storage layer for notes
// One JSON file per note plus a summary index, all inside <base>/notes/

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{NotesError, NotesResult};
use crate::models::{IndexEntry, Note, Settings, isValidNoteId};

pub const NOTES_DIR_NAME: &str = "notes";
pub const INDEX_FILE_NAME: &str = "notes_index.json";
const TEMP_SUFFIX: &str = "tmp";

// ============================================
// PATH HELPERS
// ============================================

/// Global config directory (~/.notekeeper/)
pub fn globalConfigDir() -> NotesResult<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| NotesError::Config("Failed to get home directory".to_string()))?;
    Ok(home.join(".notekeeper"))
}

/// Global config file path
pub fn globalConfigPath() -> NotesResult<PathBuf> {
    Ok(globalConfigDir()?.join("config.md"))
}

/// Notes directory under a base directory
pub fn notesDir(baseDir: &Path) -> PathBuf {
    baseDir.join(NOTES_DIR_NAME)
}

fn tempPathFor(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

// ============================================
// FRONTMATTER PARSING
// ============================================

/// Parse YAML frontmatter from markdown content
pub fn parseFrontmatter<T: DeserializeOwned>(content: &str) -> Option<(T, String)> {
    let content = content.trim();
    let rest = content.strip_prefix("---")?;
    let end = rest.find("\n---")?;
    let yaml = rest[..end].trim();
    let body = rest[end + 4..].trim().to_string();

    let frontmatter: T = serde_yaml::from_str(yaml).ok()?;
    Some((frontmatter, body))
}

/// Serialize frontmatter + body to markdown
pub fn toMarkdown<T: Serialize>(frontmatter: &T, body: &str) -> NotesResult<String> {
    let yaml = serde_yaml::to_string(frontmatter).map_err(|e| NotesError::Config(format!("YAML error: {}", e)))?;
    Ok(format!("---\n{}---\n\n{}", yaml, body))
}

// ============================================
// GLOBAL CONFIG
// ============================================

/// Load settings; a missing or unreadable file yields defaults
pub fn loadSettings(path: &Path) -> Settings {
    if !path.exists() {
        tracing::debug!("[loadSettings] {} does not exist, using defaults", path.display());
        return Settings::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "[loadSettings] read failed, using defaults");
            return Settings::default();
        }
    };

    match parseFrontmatter::<Settings>(&content) {
        Some((settings, _)) => settings,
        None => {
            tracing::warn!(path = %path.display(), "[loadSettings] failed to parse frontmatter, using defaults");
            Settings::default()
        }
    }
}

pub fn saveSettings(path: &Path, settings: &Settings) -> NotesResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| NotesError::write(parent, e))?;
    }
    let body = "# Notekeeper settings\n\nEdit the frontmatter above; unknown keys are ignored.\n";
    let content = toMarkdown(settings, body)?;
    fs::write(path, content).map_err(|e| NotesError::write(path, e))?;
    tracing::info!("[saveSettings] wrote {}", path.display());
    Ok(())
}

// ============================================
// JSON FILE I/O
// ============================================

/// Read and parse one JSON file; Ok(None) when the file does not exist
fn readJson<T: DeserializeOwned>(path: &Path) -> NotesResult<Option<T>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(NotesError::read(path, e)),
    };
    let value = serde_json::from_reader(BufReader::new(file)).map_err(|e| NotesError::read(path, e))?;
    Ok(Some(value))
}

/// Pretty JSON (2-space indent, UTF-8 written literally) via temp file + rename
fn writeJsonAtomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> NotesResult<()> {
    let tempPath = tempPathFor(path);
    let result = writeJsonFile(&tempPath, value).and_then(|_| fs::rename(&tempPath, path).map_err(|e| NotesError::write(path, e)));
    if result.is_err() && tempPath.is_file() {
        let _ = fs::remove_file(&tempPath);
    }
    result
}

fn writeJsonFile<T: Serialize + ?Sized>(path: &Path, value: &T) -> NotesResult<()> {
    let file = File::create(path).map_err(|e| NotesError::write(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| NotesError::write(path, e))?;
    writer.flush().map_err(|e| NotesError::write(path, e))?;
    writer.get_ref().sync_all().map_err(|e| NotesError::write(path, e))
}

// ============================================
// STORAGE STATE
// ============================================

/// In-memory copy of the index; the caller's source of truth between saves
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteIndex {
    entries: Vec<IndexEntry>,
}

impl NoteIndex {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn isEmpty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Replaces the entry for entry.id in place (dropping duplicates), or appends it
    pub fn upsert(&mut self, entry: IndexEntry) {
        match self.entries.iter().position(|e| e.id == entry.id) {
            Some(at) => {
                let id = entry.id.clone();
                self.entries[at] = entry;
                let mut seen = false;
                self.entries.retain(|e| {
                    if e.id != id {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => self.entries.push(entry),
        }
    }

    /// Removes every entry with this id; true if any was present
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }
}

// ============================================
// STORAGE MANAGER
// ============================================

/// Result of comparing the index against the files on disk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Note files with no index entry
    pub orphanFiles: Vec<String>,
    /// Index entries whose note file is missing
    pub danglingEntries: Vec<String>,
}

impl ConsistencyReport {
    pub fn isConsistent(&self) -> bool {
        self.orphanFiles.is_empty() && self.danglingEntries.is_empty()
    }
}

/// Main storage manager, bound to one base directory
#[derive(Debug, Clone)]
pub struct Storage {
    baseDir: PathBuf,
    notesDir: PathBuf,
}

impl Storage {
    /// Creates <baseDir>/notes/ if it is missing
    pub fn new(baseDir: impl Into<PathBuf>) -> NotesResult<Self> {
        let baseDir = baseDir.into();
        let notesDir = notesDir(&baseDir);
        fs::create_dir_all(&notesDir).map_err(|e| NotesError::write(&notesDir, e))?;
        tracing::info!("[Storage::new] Notes directory: {}", notesDir.display());
        Ok(Self { baseDir, notesDir })
    }

    pub fn baseDir(&self) -> &Path {
        &self.baseDir
    }

    pub fn notesDir(&self) -> &Path {
        &self.notesDir
    }

    pub fn indexPath(&self) -> PathBuf {
        self.notesDir.join(INDEX_FILE_NAME)
    }

    pub fn notePath(&self, id: &str) -> NotesResult<PathBuf> {
        if !isValidNoteId(id) {
            return Err(NotesError::InvalidId(id.to_string()));
        }
        Ok(self.notesDir.join(format!("{}.json", id)))
    }

    /// All index entries; an absent index file is an empty store
    pub fn loadIndex(&self) -> NotesResult<Vec<IndexEntry>> {
        let path = self.indexPath();
        let entries: Vec<IndexEntry> = readJson(&path)?.unwrap_or_default();
        tracing::debug!("[loadIndex] {} entries", entries.len());
        Ok(entries)
    }

    /// Replaces the index file with the full given sequence
    pub fn saveIndex(&self, entries: &[IndexEntry]) -> NotesResult<()> {
        let path = self.indexPath();
        writeJsonAtomic(&path, entries).inspect_err(|e| {
            tracing::error!(error = %e, "[saveIndex] failed");
        })?;
        tracing::debug!("[saveIndex] wrote {} entries", entries.len());
        Ok(())
    }

    pub fn loadNote(&self, id: &str) -> NotesResult<Option<Note>> {
        let path = self.notePath(id)?;
        let note: Option<Note> = readJson(&path)?;
        match note {
            Some(note) if note.id != id => Err(NotesError::read(
                &path,
                format!("file holds note '{}', expected '{}'", note.id, id),
            )),
            other => {
                tracing::debug!("[loadNote] {} found: {}", id, other.is_some());
                Ok(other)
            }
        }
    }

    /// Overwrites the whole record for note.id
    pub fn saveNote(&self, note: &Note) -> NotesResult<()> {
        let path = self.notePath(&note.id)?;
        writeJsonAtomic(&path, note).inspect_err(|e| {
            tracing::error!(id = %note.id, error = %e, "[saveNote] failed");
        })?;
        tracing::info!("[saveNote] Note saved successfully: {}", path.display());
        Ok(())
    }

    /// Idempotent: a missing file is not an error
    pub fn deleteNote(&self, id: &str) -> NotesResult<()> {
        let path = self.notePath(id)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!("[deleteNote] removed {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("[deleteNote] {} already absent", id);
                Ok(())
            }
            Err(e) => Err(NotesError::write(&path, e)),
        }
    }

    /// Ids of every <id>.json note file, sorted
    pub fn scanNoteIds(&self) -> NotesResult<Vec<String>> {
        let entries = fs::read_dir(&self.notesDir).map_err(|e| NotesError::read(&self.notesDir, e))?;

        let mut ids: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().map(|ext| ext == "json").unwrap_or(false))
            .filter(|p| p.file_name().map(|n| n != INDEX_FILE_NAME).unwrap_or(false))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .filter(|id| isValidNoteId(id))
            .collect();
        ids.sort();
        Ok(ids)
    }

    pub fn checkConsistency(&self, entries: &[IndexEntry]) -> NotesResult<ConsistencyReport> {
        let onDisk: BTreeSet<String> = self.scanNoteIds()?.into_iter().collect();
        let indexed: BTreeSet<&str> = entries.iter().map(|e| e.id.as_str()).collect();

        let orphanFiles = onDisk.iter().filter(|id| !indexed.contains(id.as_str())).cloned().collect();
        let danglingEntries = indexed
            .iter()
            .filter(|id| !onDisk.contains(**id))
            .map(|id| id.to_string())
            .collect();

        let report = ConsistencyReport { orphanFiles, danglingEntries };
        if !report.isConsistent() {
            tracing::warn!(
                orphans = report.orphanFiles.len(),
                dangling = report.danglingEntries.len(),
                "[checkConsistency] index and note files disagree"
            );
        }
        Ok(report)
    }
}
