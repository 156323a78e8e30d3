use std::{collections::BTreeMap, path::PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::error::DocumentError;
use super::file_manager::{DocumentStore, YamlFile};

/// Notes longer than this are cut off
pub const MAX_NOTE_CHARS: usize = 16;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NotesFile {
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct NotesStore {
    file: YamlFile,
}

impl NotesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: YamlFile::new(path),
        }
    }

    /// All notes keyed by domain. An unreadable file reads as no notes.
    pub fn get_notes(&self) -> BTreeMap<String, String> {
        self.load().notes
    }

    /// Set the note for `domain`; a blank note removes it
    pub fn set_note(&self, domain: &str, note: &str) -> Result<(), DocumentError> {
        let trimmed: String = note.trim().chars().take(MAX_NOTE_CHARS).collect();
        let mut state = self.load();

        if trimmed.is_empty() {
            if state.notes.remove(domain).is_none() {
                return Ok(());
            }
            info!("Removed note for {}", domain);
        } else {
            info!("Set note for {}", domain);
            state.notes.insert(domain.to_string(), trimmed);
        }

        self.save(&state)
    }

    pub fn remove_note(&self, domain: &str) -> Result<(), DocumentError> {
        let mut state = self.load();
        if state.notes.remove(domain).is_none() {
            return Ok(());
        }
        info!("Removed note for {}", domain);
        self.save(&state)
    }

    /// Drop the notes of every domain `keep` rejects. Returns the removed domains.
    pub fn retain_notes(
        &self,
        keep: impl Fn(&str) -> bool,
    ) -> Result<Vec<String>, DocumentError> {
        let mut state = self.load();
        let removed: Vec<String> = state
            .notes
            .keys()
            .filter(|domain| !keep(domain.as_str()))
            .cloned()
            .collect();
        if removed.is_empty() {
            return Ok(removed);
        }

        for domain in &removed {
            state.notes.remove(domain);
        }
        info!("Removed notes for unrouted domains: {}", removed.join(", "));
        self.save(&state)?;
        Ok(removed)
    }

    fn load(&self) -> NotesFile {
        let document = match self.file.read() {
            Ok(document) if !document.is_null() => document,
            Ok(_) => return NotesFile::default(),
            Err(err) => {
                warn!(
                    "Failed to read notes file {}: {}",
                    self.file.path().display(),
                    err
                );
                return NotesFile::default();
            }
        };

        match serde_yaml::from_value(document) {
            Ok(notes) => notes,
            Err(err) => {
                warn!(
                    "Failed to parse notes file {}: {}",
                    self.file.path().display(),
                    err
                );
                NotesFile::default()
            }
        }
    }

    fn save(&self, state: &NotesFile) -> Result<(), DocumentError> {
        let document = serde_yaml::to_value(state)?;
        self.file.write(&document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn set_trims_and_truncates() {
        let dir = tempdir().unwrap();
        let store = NotesStore::new(dir.path().join("notes.yml"));

        store
            .set_note("mc.example.com", "   survival world, season three  ")
            .unwrap();
        let notes = store.get_notes();
        assert_eq!(notes["mc.example.com"], "survival world, ");
        assert_eq!(notes["mc.example.com"].chars().count(), MAX_NOTE_CHARS);
    }

    #[test]
    fn blank_note_removes_entry() {
        let dir = tempdir().unwrap();
        let store = NotesStore::new(dir.path().join("notes.yml"));

        store.set_note("a.example.com", "lobby").unwrap();
        store.set_note("b.example.com", "creative").unwrap();
        store.set_note("a.example.com", "   ").unwrap();

        let notes = store.get_notes();
        assert!(!notes.contains_key("a.example.com"));
        assert_eq!(notes["b.example.com"], "creative");
    }

    #[test]
    fn remove_missing_note_is_noop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.yml");
        let store = NotesStore::new(&path);

        store.remove_note("nothing.example.com").unwrap();
        assert!(!path.exists());

        store.set_note("x.example.com", "hub").unwrap();
        store.remove_note("x.example.com").unwrap();
        assert!(store.get_notes().is_empty());
    }

    #[test]
    fn retain_drops_rejected_domains() {
        let dir = tempdir().unwrap();
        let store = NotesStore::new(dir.path().join("notes.yml"));
        store.set_note("a.example.com", "lobby").unwrap();
        store.set_note("b.example.com", "creative").unwrap();

        let removed = store.retain_notes(|domain| domain == "b.example.com").unwrap();
        assert_eq!(removed, vec!["a.example.com"]);
        assert_eq!(store.get_notes().len(), 1);

        assert!(store.retain_notes(|_| true).unwrap().is_empty());
        assert_eq!(store.get_notes()["b.example.com"], "creative");
    }

    #[test]
    fn unparseable_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.yml");
        std::fs::write(&path, "notes: [1, 2\n").unwrap();
        assert!(NotesStore::new(&path).get_notes().is_empty());
    }
}
