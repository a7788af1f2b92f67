//! Playbook data model.
//!
//! The serialized shape is the on-disk format: a top-level `sections` list,
//! each section carrying a `title` and its `bulletpoints`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Section used when an ADD names no section.
pub const DEFAULT_SECTION: &str = "General";

/// A single piece of curated advice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Identifier, unique across the whole playbook.
    pub id: String,
    /// Free-form advice text.
    #[serde(default)]
    pub content: String,
    /// Times a Reflector judged this entry helpful.
    #[serde(default)]
    pub helpful: u32,
    /// Times a Reflector judged this entry harmful.
    #[serde(default)]
    pub harmful: u32,
}

impl Entry {
    /// Creates an entry with zeroed counters.
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self { id: id.into(), content: content.into(), helpful: 0, harmful: 0 }
    }
}

/// A titled group of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Lookup key for the section.
    #[serde(default)]
    pub title: String,
    /// Entries in insertion order.
    #[serde(default)]
    pub bulletpoints: Vec<Entry>,
}

impl Section {
    /// Creates an empty section.
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), bulletpoints: Vec::new() }
    }
}

/// The playbook: an ordered list of sections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playbook {
    /// Sections in display order.
    #[serde(default)]
    pub sections: Vec<Section>,
}

impl Playbook {
    /// Creates an empty playbook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all sections.
    pub fn entry_count(&self) -> usize {
        self.sections.iter().map(|s| s.bulletpoints.len()).sum()
    }

    /// Iterates over every entry with its section, in display order.
    pub fn entries(&self) -> impl Iterator<Item = (&Section, &Entry)> {
        self.sections.iter().flat_map(|s| s.bulletpoints.iter().map(move |e| (s, e)))
    }

    /// Finds a section by exact title. The first match wins.
    pub fn find_section(&self, title: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.title == title)
    }

    fn find_section_index(&self, title: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.title == title)
    }

    /// Finds an entry by id across all sections. The first match wins.
    pub fn find_entry(&self, id: &str) -> Option<&Entry> {
        self.entries().map(|(_, e)| e).find(|e| e.id == id)
    }

    /// Mutable variant of [`Playbook::find_entry`].
    pub fn find_entry_mut(&mut self, id: &str) -> Option<&mut Entry> {
        self.sections.iter_mut().flat_map(|s| s.bulletpoints.iter_mut()).find(|e| e.id == id)
    }

    /// Whether any entry carries `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.find_entry(id).is_some()
    }

    /// Ids that appear more than once, in first-seen order.
    pub fn duplicate_ids(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for (_, entry) in self.entries() {
            if !seen.insert(entry.id.as_str()) && !duplicates.contains(&entry.id) {
                duplicates.push(entry.id.clone());
            }
        }
        duplicates
    }

    /// Mints an id not present in the playbook.
    fn mint_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.contains_id(&id) {
                return id;
            }
        }
    }

    /// Appends a new entry to `title`, creating the section at the end when
    /// absent. Returns the minted id.
    pub fn add_entry(&mut self, title: &str, content: impl Into<String>) -> String {
        let id = self.mint_id();
        let index = if let Some(index) = self.find_section_index(title) {
            index
        } else {
            self.sections.push(Section::new(title));
            self.sections.len() - 1
        };
        self.sections[index].bulletpoints.push(Entry::new(id.clone(), content));
        id
    }

    /// Deletes every entry with `id`. Returns how many were removed.
    pub fn remove_entry(&mut self, id: &str) -> usize {
        let mut removed = 0;
        for section in &mut self.sections {
            let before = section.bulletpoints.len();
            section.bulletpoints.retain(|e| e.id != id);
            removed += before - section.bulletpoints.len();
        }
        removed
    }

    /// Overwrites the content of every entry with `id`, keeping id and
    /// counters. Returns how many were modified.
    pub fn modify_entry(&mut self, id: &str, content: &str) -> usize {
        let mut modified = 0;
        for entry in self.sections.iter_mut().flat_map(|s| s.bulletpoints.iter_mut()) {
            if entry.id == id {
                entry.content = content.to_string();
                modified += 1;
            }
        }
        modified
    }
}
