// Common helpers for commands

use chrono::TimeDelta;

use crate::models::Timestamp;
use crate::storage::NoteIndex;

/// Current local time at storage precision
pub fn now() -> Timestamp {
    Timestamp::now()
}

/// Id from `at` (YYYYMMDD_HHMMSS), moved forward a second at a time past ids already indexed
pub fn newId(index: &NoteIndex, at: Timestamp) -> String {
    let mut candidate = at;
    loop {
        let id = candidate.noteId();
        if !index.contains(&id) {
            return id;
        }
        match candidate.checkedAdd(TimeDelta::seconds(1)) {
            Some(next) => candidate = next,
            None => return id,
        }
    }
}
