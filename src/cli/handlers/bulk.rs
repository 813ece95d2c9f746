// src/cli/handlers/bulk.rs

//! Define-all runs: many queries from one file, each turned into a card.

use anyhow::{Context, Result, anyhow};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::handlers::commons::InteractiveInput;
use crate::cli::handlers::search;
use crate::cli::session::Session;
use crate::core::paths::display_path;
use crate::core::query::parse_query;
use crate::core::selection::SelectionMode;
use crate::state;

/// Finds the define-all file in `dir`: the first file, by name, whose name
/// starts with `define` and contains `all`.
pub fn find_define_all_file(dir: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().to_lowercase())
                .is_some_and(|name| name.starts_with("define") && name.contains("all"))
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Splits the file content into queries. `\n` and `\t` in the separator
/// stand for a newline and a tab.
pub fn split_queries(content: &str, separator: &str) -> Vec<String> {
    let separator = separator.replace("\\n", "\n").replace("\\t", "\t");
    let separator = if separator.is_empty() { "\n".to_string() } else { separator };
    content
        .split(separator.as_str())
        .map(|query| query.trim().replace('\n', " "))
        .filter(|query| !query.is_empty())
        .collect()
}

/// Runs every query of `path` with the stored bulk choices.
pub fn run(session: &Session, path: &Path, separator: Option<&str>) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!(t!("bulk.error.read"), path = display_path(path)))?;
    let queries = split_queries(&content, separator.unwrap_or("\n"));
    if queries.is_empty() {
        println!("{}", format!(t!("bulk.info.empty"), path = display_path(path)).yellow());
        return Ok(());
    }

    println!(
        "{}",
        format!(t!("bulk.info.start"), count = queries.len(), path = display_path(path)).bold()
    );

    let mut input = InteractiveInput;
    let mut created = 0;
    for (index, line) in queries.iter().enumerate() {
        println!("\n{} {}", format!("[{}/{}]", index + 1, queries.len()).dimmed(), line.bold());
        let Some(query) = parse_query(line) else {
            println!("{}", format!(t!("search.error.invalid_query"), query = line).yellow());
            continue;
        };

        // Settings may change between cards; the bulk choices are read per card.
        let mode = SelectionMode::Bulk(state::snapshot().bulk);
        match search::handle(session, &query, mode, &mut input) {
            Ok(delivered) if delivered > 0 => created += 1,
            Ok(_) => {}
            Err(e) => search::report(session, &e),
        }
    }

    println!(
        "\n{}",
        format!(t!("bulk.info.exhausted"), created = created, count = queries.len()).green()
    );
    Ok(())
}

/// `--define-all [sep]` typed at the search prompt: uses the define-all
/// file from the current directory.
pub fn handle(session: &Session, arg: &str) -> Result<()> {
    let dir = std::env::current_dir().context(t!("bulk.error.cwd"))?;
    let path = find_define_all_file(&dir)
        .ok_or_else(|| anyhow!(t!("bulk.error.no_file"), dir = display_path(&dir)))?;
    let separator = Some(arg.trim()).filter(|sep| !sep.is_empty());
    run(session, &path, separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queries_are_split_and_trimmed() {
        let content = "mint -n\n\n  give up  \nbreak the ice -i\n";
        assert_eq!(
            split_queries(content, "\n"),
            vec!["mint -n", "give up", "break the ice -i"]
        );
    }

    #[test]
    fn test_escaped_separators_are_understood() {
        assert_eq!(split_queries("a\tb\t c", "\\t"), vec!["a", "b", "c"]);
        assert_eq!(split_queries("a;b\nc;", ";"), vec!["a", "b c"]);
    }

    #[test]
    fn test_define_all_file_is_found_by_name() {
        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("define_all.txt"), "mint").unwrap();
        fs::write(dir.path().join("Define-ALL-2.txt"), "mint").unwrap();
        fs::create_dir(dir.path().join("define_all_dir")).unwrap();

        // --- Execute ---
        let found = find_define_all_file(dir.path()).unwrap();

        // --- Assert ---
        assert_eq!(found.file_name().unwrap(), "Define-ALL-2.txt");
    }

    #[test]
    fn test_missing_define_all_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("words.txt"), "mint").unwrap();
        assert!(find_define_all_file(dir.path()).is_none());
    }
}
