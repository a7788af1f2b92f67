//! File-backed playbook store.
//!
//! Loading never fails: a missing, empty or corrupt file yields an empty
//! playbook. Every mutation is written back in full through a sibling temp
//! file that is renamed over the target, so readers see either the old or the
//! new document.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::error::{PlaybookError, Result};
use super::stats::TagSummary;
use super::types::{DEFAULT_SECTION, Playbook};
use crate::curation::{CurationEffect, CurationOp};
use crate::verdict::Verdict;

/// Owns the in-memory playbook and its backing file.
#[derive(Debug, Clone)]
pub struct PlaybookStore {
    path: PathBuf,
    playbook: Playbook,
    default_section: String,
}

impl PlaybookStore {
    /// Opens the store at `path`, loading whatever is there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let playbook = Self::load(&path);
        Self { path, playbook, default_section: DEFAULT_SECTION.to_string() }
    }

    /// Overrides the section used by ADD when no title is given.
    #[must_use]
    pub fn with_default_section(mut self, title: impl Into<String>) -> Self {
        let title = title.into();
        if !title.trim().is_empty() {
            self.default_section = title;
        }
        self
    }

    /// Reads a playbook file, falling back to an empty playbook.
    pub fn load(path: &Path) -> Playbook {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No playbook file, starting empty");
                return Playbook::new();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read playbook, starting empty");
                return Playbook::new();
            }
        };

        if content.trim().is_empty() {
            debug!(path = %path.display(), "Playbook file is empty");
            return Playbook::new();
        }

        match serde_json::from_str::<Playbook>(&content) {
            Ok(playbook) => {
                let duplicates = playbook.duplicate_ids();
                if !duplicates.is_empty() {
                    warn!(path = %path.display(), ?duplicates, "Playbook contains duplicate entry ids");
                }
                debug!(
                    path = %path.display(),
                    sections = playbook.sections.len(),
                    entries = playbook.entry_count(),
                    "Loaded playbook"
                );
                playbook
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Playbook file is not valid, starting empty");
                Playbook::new()
            }
        }
    }

    /// Replaces the in-memory playbook with the file contents.
    pub fn reload(&mut self) {
        self.playbook = Self::load(&self.path);
    }

    /// Writes the full playbook to disk.
    pub fn save(&self) -> Result<()> {
        let json = to_pretty_json(&self.playbook)?;
        atomic_write(&self.path, &json).map_err(|source| {
            error!(path = %self.path.display(), error = %source, "Failed to persist playbook");
            PlaybookError::Persist { path: self.path.clone(), source }
        })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current in-memory playbook.
    pub fn playbook(&self) -> &Playbook {
        &self.playbook
    }

    /// Section ADD falls back to.
    pub fn default_section(&self) -> &str {
        &self.default_section
    }

    /// Renders the current playbook.
    pub fn render(&self) -> String {
        self.playbook.render()
    }

    /// Applies a change and persists it. If persisting fails the in-memory
    /// playbook is rolled back so it keeps matching the file.
    fn mutate<T>(&mut self, change: impl FnOnce(&mut Playbook) -> T) -> Result<T> {
        let snapshot = self.playbook.clone();
        let value = change(&mut self.playbook);
        if let Err(e) = self.save() {
            self.playbook = snapshot;
            return Err(e);
        }
        Ok(value)
    }

    /// ADD: appends an entry and returns its minted id.
    pub fn add(&mut self, section: Option<&str>, content: &str) -> Result<String> {
        let title = match section {
            Some(title) if !title.trim().is_empty() => title.to_string(),
            _ => self.default_section.clone(),
        };
        let id = self.mutate(|playbook| playbook.add_entry(&title, content))?;
        info!(entry_id = %id, section = %title, "Added playbook entry");
        Ok(id)
    }

    /// REMOVE: deletes every entry with `id`. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Result<usize> {
        let count = self.mutate(|playbook| playbook.remove_entry(id))?;
        if count == 0 {
            debug!(entry_id = %id, "REMOVE for unknown entry");
        } else {
            info!(entry_id = %id, count, "Removed playbook entry");
        }
        Ok(count)
    }

    /// MODIFY: rewrites every entry with `id`. Unknown ids are a no-op.
    pub fn modify(&mut self, id: &str, content: &str) -> Result<usize> {
        let count = self.mutate(|playbook| playbook.modify_entry(id, content))?;
        if count == 0 {
            debug!(entry_id = %id, "MODIFY for unknown entry");
        } else {
            info!(entry_id = %id, count, "Modified playbook entry");
        }
        Ok(count)
    }

    /// Applies one curation operation and persists the result.
    pub fn apply(&mut self, op: &CurationOp) -> Result<CurationEffect> {
        match op {
            CurationOp::Add { section, content } => {
                let id = self.add(section.as_deref(), content)?;
                let section = self
                    .playbook
                    .entries()
                    .find(|(_, e)| e.id == id)
                    .map(|(s, _)| s.title.clone())
                    .unwrap_or_default();
                Ok(CurationEffect::Added { id, section })
            }
            CurationOp::Remove { bullet_id } => {
                let count = self.remove(bullet_id)?;
                Ok(CurationEffect::Removed { id: bullet_id.clone(), count })
            }
            CurationOp::Modify { bullet_id, content } => {
                let count = self.modify(bullet_id, content)?;
                Ok(CurationEffect::Modified { id: bullet_id.clone(), count })
            }
        }
    }

    /// Applies a verdict's tags and persists once.
    pub fn apply_verdict(&mut self, verdict: &Verdict) -> Result<TagSummary> {
        let summary = self.mutate(|playbook| playbook.apply_tags(&verdict.bullet_tags))?;
        info!(
            helpful = summary.helpful,
            harmful = summary.harmful,
            neutral = summary.neutral,
            unknown = summary.unknown,
            "Applied verdict tags"
        );
        Ok(summary)
    }
}

fn to_pretty_json(playbook: &Playbook) -> Result<String> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    playbook.serialize(&mut serializer)?;
    // serde_json only ever emits UTF-8.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Writes `content` next to `path` under a unique name, then renames it over
/// `path`.
fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    fs::create_dir_all(parent)?;

    let file_name = path.file_name().and_then(|s| s.to_str()).unwrap_or("playbook");
    let temp_path = parent.join(format!(".{}.tmp.{}", file_name, Uuid::new_v4()));

    if let Err(e) = fs::write(&temp_path, content) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::{BulletTag, EntryTag};
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> PlaybookStore {
        PlaybookStore::open(dir.path().join("playbook.json"))
    }

    #[test]
    fn test_missing_and_empty_files_load_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playbook.json");
        assert!(PlaybookStore::load(&path).sections.is_empty());

        fs::write(&path, "  \n").unwrap();
        assert!(PlaybookStore::load(&path).sections.is_empty());

        let mut store = PlaybookStore::open(&path);
        store.add(Some("General"), "first").unwrap();
        assert_eq!(PlaybookStore::load(&path).entry_count(), 1);
    }

    #[test]
    fn test_corrupt_files_load_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("playbook.json");
        for content in ["{not json", "[]", r#"{"sections": [{"title": "T", "bulletpoints": [{"content": "no id"}]}]}"#]
        {
            fs::write(&path, content).unwrap();
            assert_eq!(PlaybookStore::load(&path), Playbook::new(), "{content}");
        }
    }

    #[test]
    fn test_save_uses_four_space_indent() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let id = store.add(None, "x").unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.starts_with("{\n    \"sections\": [\n        {\n"));
        assert!(text.contains(&format!("\"id\": \"{id}\"")));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp."))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let mut store = PlaybookStore::open(dir.path().join("res/nested/playbook.json"));
        store.add(Some("S"), "c").unwrap();
        assert!(dir.path().join("res/nested/playbook.json").exists());
    }

    #[test]
    fn test_blank_section_goes_to_default() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        store.add(None, "a").unwrap();
        store.add(Some("   "), "b").unwrap();
        store.add(Some(""), "c").unwrap();

        assert_eq!(store.playbook().sections.len(), 1);
        assert_eq!(store.playbook().sections[0].title, "General");
        assert_eq!(store.playbook().entry_count(), 3);

        let mut custom = PlaybookStore::open(dir.path().join("other.json")).with_default_section("Misc");
        custom.add(None, "d").unwrap();
        assert_eq!(custom.playbook().sections[0].title, "Misc");
    }

    #[test]
    fn test_lifecycle_scenario() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);

        let effect = store
            .apply(&CurationOp::Add {
                section: Some("General".to_string()),
                content: "always check boundaries".to_string(),
            })
            .unwrap();
        let CurationEffect::Added { id, section } = effect else { panic!("expected Added") };
        assert_eq!(section, "General");

        let summary = store.apply_verdict(&Verdict {
            bullet_tags: vec![BulletTag::new(id.clone(), EntryTag::Helpful)],
            ..Verdict::default()
        });
        assert_eq!(summary.unwrap().helpful, 1);

        store
            .apply(&CurationOp::Modify { bullet_id: id.clone(), content: "always check boundaries first".to_string() })
            .unwrap();
        let on_disk = PlaybookStore::load(store.path());
        let entry = on_disk.find_entry(&id).unwrap();
        assert_eq!(entry.content, "always check boundaries first");
        assert_eq!((entry.helpful, entry.harmful), (1, 0));

        let effect = store.apply(&CurationOp::Remove { bullet_id: id.clone() }).unwrap();
        assert_eq!(effect, CurationEffect::Removed { id: id.clone(), count: 1 });
        let effect = store.apply(&CurationOp::Remove { bullet_id: id.clone() }).unwrap();
        assert_eq!(effect, CurationEffect::Removed { id, count: 0 });

        let on_disk = PlaybookStore::load(store.path());
        assert_eq!(on_disk.sections.len(), 1);
        assert_eq!(on_disk.entry_count(), 0);
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let dir = TempDir::new().unwrap();
        let mut store = store_in(&dir);
        let mut other = store_in(&dir);
        other.add(Some("S"), "from elsewhere").unwrap();

        assert_eq!(store.playbook().entry_count(), 0);
        store.reload();
        assert_eq!(store.playbook().entry_count(), 1);
    }

    #[test]
    fn test_failed_save_rolls_back_memory() {
        let dir = TempDir::new().unwrap();
        // A directory sitting at the target path makes the rename fail.
        let path = dir.path().join("playbook.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let mut store = PlaybookStore::open(&path);
        let err = store.add(None, "lost").unwrap_err();
        assert!(matches!(err, PlaybookError::Persist { .. }));
        assert_eq!(store.playbook().entry_count(), 0);
    }
}
