//! Playbook maintenance commands.

use ace_core::{BulletTag, EntryTag, PlaybookStore, Verdict};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::json;

/// Prints the rendered playbook, or the JSON document.
pub fn show(store: &PlaybookStore, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(store.playbook())?);
        return Ok(());
    }

    if store.playbook().sections.is_empty() {
        println!("{}", "Playbook is empty.".dimmed());
        println!("Add entries using: {}", "ace add --section <title> --content <text>".bright_blue());
        return Ok(());
    }

    println!("{}", store.render());
    Ok(())
}

/// ADD.
pub fn add(store: &mut PlaybookStore, section: Option<&str>, content: &str) -> Result<()> {
    let id = store.add(section, content).with_context(|| format!("Failed to add entry to {}", store.path().display()))?;
    let title = store
        .playbook()
        .entries()
        .find(|(_, e)| e.id == id)
        .map(|(s, _)| s.title.clone())
        .unwrap_or_default();

    println!("{}", "Entry added successfully".green().bold());
    println!("  ID: {}", id.cyan());
    println!("  Section: {}", title.cyan());
    println!("  Content: {}", content);
    Ok(())
}

/// REMOVE.
pub fn remove(store: &mut PlaybookStore, id: &str) -> Result<()> {
    let count = store.remove(id).with_context(|| format!("Failed to update {}", store.path().display()))?;
    if count == 0 {
        println!("{}", format!("No entry with id {}", id).yellow());
    } else {
        println!("{}", format!("Removed {} entry(ies) with id {}", count, id).green().bold());
    }
    Ok(())
}

/// MODIFY.
pub fn modify(store: &mut PlaybookStore, id: &str, content: &str) -> Result<()> {
    let count =
        store.modify(id, content).with_context(|| format!("Failed to update {}", store.path().display()))?;
    if count == 0 {
        println!("{}", format!("No entry with id {}", id).yellow());
    } else {
        println!("{}", format!("Modified {} entry(ies) with id {}", count, id).green().bold());
    }
    Ok(())
}

/// Applies a single-tag verdict.
pub fn tag(store: &mut PlaybookStore, id: &str, tag: EntryTag) -> Result<()> {
    let verdict = Verdict { bullet_tags: vec![BulletTag::new(id, tag)], ..Verdict::default() };
    let summary =
        store.apply_verdict(&verdict).with_context(|| format!("Failed to update {}", store.path().display()))?;

    if summary.unknown > 0 {
        println!("{}", format!("No entry with id {}", id).yellow());
        return Ok(());
    }

    match store.playbook().find_entry(id) {
        Some(entry) => println!(
            "{}",
            format!("Entry {} tagged as {} (helpful: {}, harmful: {})", id, tag, entry.helpful, entry.harmful)
                .green()
                .bold()
        ),
        None => println!("{}", format!("Entry {} tagged as {}", id, tag).green().bold()),
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct SectionStats {
    title: String,
    entries: usize,
    helpful: u64,
    harmful: u64,
}

/// Prints per-section entry counts and counter totals.
pub fn stats(store: &PlaybookStore, json: bool) -> Result<()> {
    let sections: Vec<SectionStats> = store
        .playbook()
        .sections
        .iter()
        .map(|s| SectionStats {
            title: s.title.clone(),
            entries: s.bulletpoints.len(),
            helpful: s.bulletpoints.iter().map(|e| u64::from(e.helpful)).sum(),
            harmful: s.bulletpoints.iter().map(|e| u64::from(e.harmful)).sum(),
        })
        .collect();

    let entries: usize = sections.iter().map(|s| s.entries).sum();
    let helpful: u64 = sections.iter().map(|s| s.helpful).sum();
    let harmful: u64 = sections.iter().map(|s| s.harmful).sum();

    if json {
        let output = json!({
            "path": store.path().display().to_string(),
            "sections": sections,
            "totals": { "sections": sections.len(), "entries": entries, "helpful": helpful, "harmful": harmful },
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", "Playbook Statistics".bold().cyan());
    println!("  {} {}", "File:".dimmed(), store.path().display());
    println!();
    println!("{:<40} {:>8} {:>8} {:>8}", "Section", "Entries", "Helpful", "Harmful");
    println!("{}", "-".repeat(67));
    for section in &sections {
        let title = if section.title.is_empty() { "(untitled)".dimmed().to_string() } else { section.title.clone() };
        println!("{:<40} {:>8} {:>8} {:>8}", title, section.entries, section.helpful, section.harmful);
    }
    println!("{}", "-".repeat(67));
    println!("{:<40} {:>8} {:>8} {:>8}", "Total", entries, helpful, harmful);
    Ok(())
}
