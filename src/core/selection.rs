// src/core/selection.rs

//! The numeric-choice protocol shared by every selectable card field.
//!
//! A choice expression is one of:
//! - empty, `0` or `-s`: skip (the field's default is used)
//! - `-1` or `all`: every candidate, joined with the field separator
//! - `k`, `a,b,c`, `a:b`: 1-based picks; any pick past the end means "all"
//! - `/text`: literal text that replaces the candidates and is never hidden
//!
//! Anything else is invalid and abandons the card.

use crate::models::{BulkSettings, FieldName};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChoiceError {
    #[error("Invalid choice: '{0}'")]
    Invalid(String),
    #[error("Input interrupted")]
    Interrupted,
}

/// A parsed choice expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Skip,
    All,
    /// 1-based, deduplicated, in the order given.
    Picks(Vec<usize>),
    Literal(String),
}

/// The resolved content of one field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedField {
    pub content: String,
    /// Came from a `/literal` expression; word hiding must leave it alone.
    pub literal: bool,
}

impl SelectedField {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            literal: false,
        }
    }
}

fn parse_index(token: &str, expr: &str) -> Result<i64, ChoiceError> {
    token
        .trim()
        .parse::<i64>()
        .map_err(|_| ChoiceError::Invalid(expr.to_string()))
}

impl Choice {
    pub fn parse(expr: &str) -> Result<Self, ChoiceError> {
        let trimmed = expr.trim();
        if let Some(literal) = trimmed.strip_prefix('/') {
            return Ok(Self::Literal(literal.to_string()));
        }

        match trimmed.to_lowercase().as_str() {
            "" | "0" | "-s" => return Ok(Self::Skip),
            "-1" | "all" => return Ok(Self::All),
            _ => {}
        }

        let mut picks: Vec<usize> = Vec::new();
        for item in trimmed.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let (start, end) = match item.split_once(':') {
                Some((a, b)) => (parse_index(a, expr)?, parse_index(b, expr)?),
                None => {
                    let index = parse_index(item, expr)?;
                    (index, index)
                }
            };
            if start == -1 || end == -1 {
                return Ok(Self::All);
            }
            if start < 0 || end < 0 {
                return Err(ChoiceError::Invalid(expr.to_string()));
            }

            let (low, high) = if start <= end { (start, end) } else { (end, start) };
            for index in low..=high {
                let Ok(index) = usize::try_from(index) else {
                    return Err(ChoiceError::Invalid(expr.to_string()));
                };
                if index > 0 && !picks.contains(&index) {
                    picks.push(index);
                }
            }
        }

        if picks.is_empty() {
            Ok(Self::Skip)
        } else {
            Ok(Self::Picks(picks))
        }
    }

    /// Turns the choice back into an expression, used as the automatic
    /// choice of fields that follow the definition choice.
    pub fn to_expression(&self) -> String {
        match self {
            Self::Skip => "0".to_string(),
            Self::All => "-1".to_string(),
            Self::Picks(picks) => picks
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            Self::Literal(text) => format!("/{}", text),
        }
    }

    /// Moves definition picks into the index space of another block list.
    ///
    /// Pick `k` becomes block `mapping[k - 1]`; a pick past the definitions
    /// or one landing on the sentinel means every block. A literal has no
    /// counterpart in other lists and becomes a skip.
    pub fn translate(&self, mapping: &[usize]) -> Self {
        let sentinel = mapping.last().copied().unwrap_or(0);
        match self {
            Self::Picks(picks) => {
                let mut blocks = Vec::new();
                for pick in picks {
                    match pick.checked_sub(1).and_then(|i| mapping.get(i)).copied() {
                        Some(block) if block < sentinel => {
                            if !blocks.contains(&(block + 1)) {
                                blocks.push(block + 1);
                            }
                        }
                        _ => return Self::All,
                    }
                }
                Self::Picks(blocks)
            }
            Self::All => Self::All,
            Self::Skip | Self::Literal(_) => Self::Skip,
        }
    }

    /// The block of the first pick that maps to a real block, or block 0.
    pub fn first_block(&self, mapping: &[usize]) -> usize {
        let sentinel = mapping.last().copied().unwrap_or(0);
        if let Self::Picks(picks) = self {
            for pick in picks {
                if let Some(block) = pick.checked_sub(1).and_then(|i| mapping.get(i)).copied() {
                    if block < sentinel {
                        return block;
                    }
                }
            }
        }
        0
    }

    /// Produces the field content for this choice.
    pub fn apply(&self, candidates: &[String], separator: &str, default: &str) -> SelectedField {
        let join_all = || {
            candidates
                .iter()
                .filter(|candidate| !candidate.is_empty())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(separator)
        };

        match self {
            Self::Skip => SelectedField::new(default),
            Self::All => SelectedField::new(join_all()),
            Self::Picks(picks) => {
                if picks.iter().any(|&pick| pick > candidates.len()) {
                    return SelectedField::new(join_all());
                }
                let chosen: Vec<&str> = picks
                    .iter()
                    .filter_map(|pick| candidates.get(pick - 1))
                    .filter(|candidate| !candidate.is_empty())
                    .map(String::as_str)
                    .collect();
                SelectedField::new(chosen.join(separator))
            }
            Self::Literal(text) => SelectedField {
                content: text.clone(),
                literal: true,
            },
        }
    }
}

/// Resolves a choice expression against a candidate list.
pub fn resolve(
    expr: &str,
    candidates: &[String],
    separator: &str,
    default: &str,
) -> Result<SelectedField, ChoiceError> {
    Ok(Choice::parse(expr)?.apply(candidates, separator, default))
}

// --- INPUT FIELDS ---

/// Where choice expressions come from. The terminal implementation prompts
/// the user; tests feed canned answers.
pub trait ChoiceInput {
    /// Reads one expression. `auto_choice` is shown as the default and is
    /// returned when the user just presses Enter.
    fn read_choice(&mut self, prompt: &str, auto_choice: &str) -> Result<String, ChoiceError>;
}

/// How a field obtains its expression.
#[derive(Debug, Clone)]
pub enum SelectionMode {
    Interactive,
    /// Uses the stored per-field integers instead of asking.
    Bulk(BulkSettings),
}

/// One selectable field of a card.
#[derive(Debug, Clone)]
pub struct InputField<'a> {
    pub field: FieldName,
    pub prompt: &'a str,
    pub candidates: &'a [String],
    pub separator: &'a str,
    pub auto_choice: String,
}

impl InputField<'_> {
    /// Obtains an expression for this field, parses it and applies it.
    /// Returns the parsed choice too, so dependent fields can follow it.
    pub fn select(
        &self,
        mode: &SelectionMode,
        input: &mut dyn ChoiceInput,
    ) -> Result<(Choice, SelectedField), ChoiceError> {
        let expr = match mode {
            SelectionMode::Bulk(bulk) if !bulk.freeform => bulk.choice_for(self.field).to_string(),
            _ => {
                let answer = input.read_choice(self.prompt, &self.auto_choice)?;
                if answer.trim().is_empty() {
                    self.auto_choice.clone()
                } else {
                    answer
                }
            }
        };

        let choice = Choice::parse(&expr)?;
        log::debug!("Field '{}' resolved '{}' to {:?}", self.field, expr, choice);
        let selected = choice.apply(self.candidates, self.separator, "");
        Ok((choice, selected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn fruits() -> Vec<String> {
        vec!["apple".to_string(), "banana".to_string()]
    }

    struct Scripted(VecDeque<&'static str>);

    impl ChoiceInput for Scripted {
        fn read_choice(&mut self, _prompt: &str, _auto: &str) -> Result<String, ChoiceError> {
            self.0.pop_front().map(str::to_string).ok_or(ChoiceError::Interrupted)
        }
    }

    #[test]
    fn test_single_pick() {
        assert_eq!(resolve("1", &fruits(), " | ", "").unwrap().content, "apple");
    }

    #[test]
    fn test_all_joins_with_separator() {
        assert_eq!(resolve("-1", &fruits(), " | ", "").unwrap().content, "apple | banana");
    }

    #[test]
    fn test_past_the_end_means_all() {
        for n in 1..6 {
            let candidates: Vec<String> = (0..n).map(|i| format!("c{}", i)).collect();
            let all = resolve("-1", &candidates, "<br>", "").unwrap();
            let beyond = resolve(&(n + 5).to_string(), &candidates, "<br>", "").unwrap();
            assert_eq!(all, beyond);
        }
    }

    #[test]
    fn test_empty_and_skip_tokens_return_default() {
        for expr in ["", "  ", "0", "-s"] {
            let selected = resolve(expr, &fruits(), " ", "fallback").unwrap();
            assert_eq!(selected.content, "fallback");
            assert!(!selected.literal);
        }
    }

    #[test]
    fn test_literal_bypasses_candidates() {
        let selected = resolve("/my own words", &fruits(), " ", "").unwrap();
        assert_eq!(selected.content, "my own words");
        assert!(selected.literal);
    }

    #[test]
    fn test_invalid_expression_is_an_error() {
        assert_eq!(
            resolve("banana", &fruits(), " ", ""),
            Err(ChoiceError::Invalid("banana".to_string()))
        );
        assert!(resolve("-3", &fruits(), " ", "").is_err());
    }

    #[test]
    fn test_lists_and_ranges_are_deduplicated() {
        let candidates: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(Choice::parse("3, 1,3").unwrap(), Choice::Picks(vec![3, 1]));
        assert_eq!(resolve("2:4", &candidates, ",", "").unwrap().content, "b,c,d");
        assert_eq!(resolve("3:2,1", &candidates, ",", "").unwrap().content, "b,c,a");
    }

    #[test]
    fn test_empty_candidates_are_skipped_when_joining() {
        let candidates = vec!["one".to_string(), String::new(), "three".to_string()];
        assert_eq!(resolve("-1", &candidates, "; ", "").unwrap().content, "one; three");
        assert_eq!(resolve("2", &candidates, "; ", "").unwrap().content, "");
    }

    #[test]
    fn test_translation_goes_through_the_block_mapping() {
        let mapping = [0, 0, 2, 2, 3];
        assert_eq!(Choice::Picks(vec![2]).translate(&mapping), Choice::Picks(vec![1]));
        assert_eq!(Choice::Picks(vec![3, 4]).translate(&mapping), Choice::Picks(vec![3]));
        assert_eq!(Choice::Picks(vec![9]).translate(&mapping), Choice::All);
        assert_eq!(Choice::All.translate(&mapping), Choice::All);
        assert_eq!(Choice::Literal("x".into()).translate(&mapping), Choice::Skip);
        assert_eq!(Choice::Picks(vec![2]).first_block(&mapping), 0);
        assert_eq!(Choice::Picks(vec![9, 3]).first_block(&mapping), 2);
        assert_eq!(Choice::All.first_block(&mapping), 0);
    }

    #[test]
    fn test_expressions_parse_back_to_the_same_choice() {
        for choice in [Choice::Skip, Choice::All, Choice::Picks(vec![2, 1])] {
            assert_eq!(Choice::parse(&choice.to_expression()).unwrap(), choice);
        }
    }

    #[test]
    fn test_input_field_uses_auto_choice_on_enter() {
        // --- Setup ---
        let candidates = fruits();
        let field = InputField {
            field: FieldName::Def,
            prompt: "Choose",
            candidates: &candidates,
            separator: "<br>",
            auto_choice: "2".to_string(),
        };
        let mut input = Scripted(VecDeque::from(["", "1"]));

        // --- Execute & Assert ---
        let (choice, selected) = field.select(&SelectionMode::Interactive, &mut input).unwrap();
        assert_eq!(choice, Choice::Picks(vec![2]));
        assert_eq!(selected.content, "banana");

        let (_, selected) = field.select(&SelectionMode::Interactive, &mut input).unwrap();
        assert_eq!(selected.content, "apple");
    }

    #[test]
    fn test_bulk_mode_uses_stored_choices_unless_freeform() {
        let candidates = fruits();
        let field = InputField {
            field: FieldName::Def,
            prompt: "Choose",
            candidates: &candidates,
            separator: " ",
            auto_choice: "1".to_string(),
        };
        let bulk = BulkSettings { def: -1, ..BulkSettings::default() };
        let mut silent = Scripted(VecDeque::new());
        let (_, selected) = field.select(&SelectionMode::Bulk(bulk.clone()), &mut silent).unwrap();
        assert_eq!(selected.content, "apple banana");

        let freeform = BulkSettings { freeform: true, ..bulk };
        let mut input = Scripted(VecDeque::from(["2"]));
        let (_, selected) = field.select(&SelectionMode::Bulk(freeform), &mut input).unwrap();
        assert_eq!(selected.content, "banana");
    }
}
