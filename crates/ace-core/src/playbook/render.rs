//! Text rendering of the playbook.
//!
//! The rendering is what every prompt sees, so it has to carry ids and
//! counters verbatim. Titles and content are escaped to keep each section
//! header and each entry on one line.

use std::fmt::Write;

use super::types::Playbook;

const ENTRY_PREFIX: &str = "   - [";
const HELPFUL_MARKER: &str = "; helpful: ";
const HARMFUL_MARKER: &str = ", harmful: ";

/// One entry recovered from a rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    /// Entry id.
    pub id: String,
    /// Unescaped content.
    pub content: String,
    /// Helpful counter.
    pub helpful: u32,
    /// Harmful counter.
    pub harmful: u32,
}

impl Playbook {
    /// Renders the playbook as numbered sections with one line per entry.
    ///
    /// An empty playbook renders as the empty string.
    pub fn render(&self) -> String {
        let mut lines = Vec::new();
        for (index, section) in self.sections.iter().enumerate() {
            let ordinal = index + 1;
            if section.title.trim().is_empty() {
                lines.push(format!("{ordinal}. Section {ordinal}"));
            } else {
                lines.push(format!("{ordinal}. {}", escape_content(&section.title)));
            }
            for entry in &section.bulletpoints {
                let mut line = String::new();
                let _ = write!(
                    line,
                    "{ENTRY_PREFIX}{}] {}{HELPFUL_MARKER}{}{HARMFUL_MARKER}{}",
                    entry.id,
                    escape_content(&entry.content),
                    entry.helpful,
                    entry.harmful
                );
                lines.push(line);
            }
        }
        lines.join("\n")
    }
}

/// Recovers entries from a [`Playbook::render`] output.
///
/// Section header lines and anything that is not an entry line are skipped.
pub fn parse_rendered(text: &str) -> Vec<RenderedEntry> {
    text.lines().filter_map(parse_entry_line).collect()
}

fn parse_entry_line(line: &str) -> Option<RenderedEntry> {
    let rest = line.strip_prefix(ENTRY_PREFIX)?;
    let (id, rest) = rest.split_once("] ")?;
    let (content, counters) = rest.rsplit_once(HELPFUL_MARKER)?;
    let (helpful, harmful) = counters.split_once(HARMFUL_MARKER)?;

    Some(RenderedEntry {
        id: id.to_string(),
        content: unescape_content(content),
        helpful: helpful.trim().parse().ok()?,
        harmful: harmful.trim().parse().ok()?,
    })
}

fn escape_content(content: &str) -> String {
    let mut escaped = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn unescape_content(escaped: &str) -> String {
    let mut content = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            content.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => content.push('\n'),
            Some('r') => content.push('\r'),
            Some('\\') => content.push('\\'),
            Some(other) => {
                content.push('\\');
                content.push(other);
            }
            None => content.push('\\'),
        }
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playbook::types::{Entry, Section};

    fn sample() -> Playbook {
        Playbook {
            sections: vec![
                Section {
                    title: "General".to_string(),
                    bulletpoints: vec![
                        Entry { id: "a1".to_string(), content: "check walls".to_string(), helpful: 3, harmful: 1 },
                        Entry {
                            id: "a2".to_string(),
                            content: "two\nlines; helpful: 9, harmful: 9 \\ end".to_string(),
                            helpful: 0,
                            harmful: 0,
                        },
                    ],
                },
                Section { title: String::new(), bulletpoints: vec![] },
            ],
        }
    }

    #[test]
    fn test_render_format() {
        let text = sample().render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "1. General");
        assert_eq!(lines[1], "   - [a1] check walls; helpful: 3, harmful: 1");
        assert_eq!(lines[2], "   - [a2] two\\nlines; helpful: 9, harmful: 9 \\\\ end; helpful: 0, harmful: 0");
        assert_eq!(lines[3], "2. Section 2");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_render_empty_playbook() {
        assert_eq!(Playbook::new().render(), "");
        assert!(parse_rendered("").is_empty());
    }

    #[test]
    fn test_parse_rendered_recovers_entries() {
        let playbook = sample();
        let parsed = parse_rendered(&playbook.render());

        let direct: Vec<RenderedEntry> = playbook
            .entries()
            .map(|(_, e)| RenderedEntry {
                id: e.id.clone(),
                content: e.content.clone(),
                helpful: e.helpful,
                harmful: e.harmful,
            })
            .collect();
        assert_eq!(parsed, direct);
    }

    #[test]
    fn test_multiline_title_stays_on_one_line() {
        let playbook = Playbook {
            sections: vec![Section {
                title: "Hazards\n   - [phantom] fake; helpful: 9, harmful: 9".to_string(),
                bulletpoints: vec![Entry::new("real", "real advice")],
            }],
        };

        let text = playbook.render();
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("1. Hazards\\n   - [phantom]"));

        let parsed = parse_rendered(&text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "real");
    }

    #[test]
    fn test_whitespace_title_renders_as_numbered_section() {
        let playbook = Playbook {
            sections: vec![Section { title: "   ".to_string(), bulletpoints: vec![Entry::new("a", "x")] }],
        };
        assert!(playbook.render().starts_with("1. Section 1\n"));
    }

    #[test]
    fn test_escape_round_trip_edge_cases() {
        for content in ["", "\\", "\\n literal", "\r\n", "trailing \\"] {
            assert_eq!(unescape_content(&escape_content(content)), content);
        }
    }

    #[test]
    fn test_parse_skips_foreign_lines() {
        let text = "1. General\nnot an entry\n   - [x] ok; helpful: 1, harmful: 2\n   - [y] broken counters; helpful: a, harmful: 0";
        let parsed = parse_rendered(text);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, "x");
        assert_eq!((parsed[0].helpful, parsed[0].harmful), (1, 2));
    }
}
