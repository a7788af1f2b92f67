//! Helpful/harmful counters driven by Reflector tags.

use serde::Serialize;
use tracing::debug;

use super::types::Playbook;
use crate::verdict::{BulletTag, EntryTag};

/// What applying a set of tags did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    /// Helpful counters bumped.
    pub helpful: usize,
    /// Harmful counters bumped.
    pub harmful: usize,
    /// Neutral tags seen.
    pub neutral: usize,
    /// Tags naming an id not in the playbook.
    pub unknown: usize,
}

impl TagSummary {
    /// Number of counters changed.
    pub fn bumped(&self) -> usize {
        self.helpful + self.harmful
    }
}

impl Playbook {
    /// Bumps the matching counter by one for every helpful or harmful tag.
    ///
    /// Only the first entry with a given id is touched. Neutral tags and
    /// unknown ids leave the playbook unchanged.
    pub fn apply_tags(&mut self, tags: &[BulletTag]) -> TagSummary {
        let mut summary = TagSummary::default();
        for BulletTag { id, tag } in tags {
            if *tag == EntryTag::Neutral {
                summary.neutral += 1;
                continue;
            }
            let Some(entry) = self.find_entry_mut(id) else {
                debug!(entry_id = %id, tag = %tag, "Ignoring tag for unknown entry");
                summary.unknown += 1;
                continue;
            };
            if *tag == EntryTag::Helpful {
                entry.helpful = entry.helpful.saturating_add(1);
                summary.helpful += 1;
            } else {
                entry.harmful = entry.harmful.saturating_add(1);
                summary.harmful += 1;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playbook::types::{Entry, Section};

    fn playbook() -> Playbook {
        Playbook {
            sections: vec![Section {
                title: "General".to_string(),
                bulletpoints: vec![Entry::new("a", "one"), Entry::new("b", "two"), Entry::new("a", "dup")],
            }],
        }
    }

    #[test]
    fn test_each_tag_bumps_once() {
        let mut playbook = playbook();
        let summary = playbook.apply_tags(&[
            BulletTag::new("a", EntryTag::Helpful),
            BulletTag::new("a", EntryTag::Helpful),
            BulletTag::new("b", EntryTag::Harmful),
        ]);

        assert_eq!(summary, TagSummary { helpful: 2, harmful: 1, neutral: 0, unknown: 0 });
        let entries = &playbook.sections[0].bulletpoints;
        assert_eq!((entries[0].helpful, entries[0].harmful), (2, 0));
        assert_eq!((entries[1].helpful, entries[1].harmful), (0, 1));
        // Only the first entry carrying a duplicated id is counted.
        assert_eq!((entries[2].helpful, entries[2].harmful), (0, 0));
    }

    #[test]
    fn test_neutral_and_unknown_change_nothing() {
        let mut playbook = playbook();
        let before = playbook.clone();
        let summary = playbook.apply_tags(&[
            BulletTag::new("a", EntryTag::Neutral),
            BulletTag::new("missing", EntryTag::Helpful),
        ]);

        assert_eq!(playbook, before);
        assert_eq!(summary.neutral, 1);
        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.bumped(), 0);
    }
}
