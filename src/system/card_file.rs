// src/system/card_file.rs

//! The tab-separated card file, one card per line, importable by Anki.

use crate::core::config_loader::write_atomically;
use crate::core::paths::display_path;
use crate::core::pipeline::CardSink;
use crate::models::{CardFields, FieldName};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Tabs and line breaks would split the record.
fn sanitize(value: &str) -> String {
    value
        .replace('\t', " ")
        .replace("\r\n", "<br>")
        .replace('\n', "<br>")
}

/// Formats one card as a file line, fields in `order`.
pub fn format_line(card: &CardFields, order: &[FieldName]) -> String {
    card.ordered(order)
        .map(sanitize)
        .collect::<Vec<_>>()
        .join("\t")
}

/// Appends one line. Each card is written and flushed as a whole.
pub fn append_card(path: &Path, card: &CardFields, order: &[FieldName]) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut line = format_line(card, order);
    line.push('\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    file.flush()
}

/// Removes the last `count` cards. Returns how many were actually removed.
pub fn delete_last(path: &Path, count: usize) -> io::Result<usize> {
    if !path.exists() {
        return Ok(0);
    }
    let content = fs::read_to_string(path)?;
    let mut lines: Vec<&str> = content.lines().collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }

    let removed = count.min(lines.len());
    lines.truncate(lines.len() - removed);

    let mut remaining = lines.join("\n");
    if !remaining.is_empty() {
        remaining.push('\n');
    }
    write_atomically(path, remaining.as_bytes())?;
    log::debug!("Removed {} line(s) from '{}'", removed, path.display());
    Ok(removed)
}

/// Delivers cards to the card file.
#[derive(Debug, Clone)]
pub struct CardFile {
    path: PathBuf,
    order: Vec<FieldName>,
}

impl CardFile {
    pub fn new(path: PathBuf, order: Vec<FieldName>) -> Self {
        Self { path, order }
    }
}

impl CardSink for CardFile {
    fn name(&self) -> &str {
        "file"
    }

    fn deliver(&mut self, card: &CardFields) -> anyhow::Result<String> {
        append_card(&self.path, card, &self.order)?;
        Ok(display_path(&self.path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(phrase: &str) -> CardFields {
        let mut card = CardFields::default();
        card.set(FieldName::Phrase, phrase);
        card.set(FieldName::Def, "line one\nline\ttwo");
        card
    }

    #[test]
    fn test_line_follows_field_order() {
        let order = [FieldName::Phrase, FieldName::Audio, FieldName::Def];
        assert_eq!(format_line(&card("mint"), &order), "mint\t\tline one<br>line two");
    }

    #[test]
    fn test_cards_are_appended() {
        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cards.txt");
        let order = [FieldName::Phrase];

        // --- Execute ---
        append_card(&path, &card("one"), &order).unwrap();
        append_card(&path, &card("two"), &order).unwrap();

        // --- Assert ---
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\n");
    }

    #[test]
    fn test_delete_last_removes_trailing_cards() {
        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.txt");
        fs::write(&path, "one\ntwo\nthree\n\n").unwrap();

        // --- Execute ---
        let removed = delete_last(&path, 2).unwrap();

        // --- Assert ---
        assert_eq!(removed, 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "one\n");
    }

    #[test]
    fn test_delete_more_than_exists_empties_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.txt");
        fs::write(&path, "one\n").unwrap();

        assert_eq!(delete_last(&path, 5).unwrap(), 1);
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(delete_last(&dir.path().join("missing.txt"), 1).unwrap(), 0);
    }

    #[test]
    fn test_sink_reports_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.txt");
        let mut sink = CardFile::new(path.clone(), vec![FieldName::Phrase]);

        let report = sink.deliver(&card("mint")).unwrap();
        assert!(report.ends_with("cards.txt"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "mint\n");
    }
}
