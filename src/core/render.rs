// src/core/render.rs

use crate::constants::MIN_TEXT_WIDTH;
use crate::core::color::{Palette, paint};
use crate::core::wrap::{wrap_and_pad, wrap_lines};
use crate::models::{CanonicalEntry, CardFields, DisplaySettings, FieldName, WrapStyle};

const BAR: &str = "─";

/// Layout options for one rendering pass.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub width: usize,
    pub style: WrapStyle,
    pub indent: usize,
    pub show_examples: bool,
    pub filter_subsenses: bool,
    pub palette: Palette,
}

impl RenderOptions {
    pub fn from_display(display: &DisplaySettings, palette: Palette, filter_subsenses: bool) -> Self {
        Self {
            width: effective_width(display),
            style: display.wrap,
            indent: display.indent(),
            show_examples: display.show_examples,
            filter_subsenses: filter_subsenses || display.filter_subsenses,
            palette,
        }
    }
}

/// The text width to render with: the terminal width when `auto_width` is
/// on, otherwise the configured width capped by the terminal.
pub fn effective_width(display: &DisplaySettings) -> usize {
    let terminal = console::Term::stdout()
        .size_checked()
        .map(|(_, columns)| usize::from(columns));

    let width = match (display.auto_width, terminal) {
        (true, Some(columns)) => columns,
        (false, Some(columns)) => display.width.min(columns),
        (_, None) => display.width,
    };
    width.max(MIN_TEXT_WIDTH)
}

fn title_line(title: &str, width: usize) -> String {
    let label = format!(" {} ", title);
    let side = width.saturating_sub(label.chars().count()) / 2;
    let mut line = format!("{}{}", BAR.repeat(side), label);
    let rest = width.saturating_sub(line.chars().count());
    line.push_str(&BAR.repeat(rest));
    line
}

/// Renders an entry into printable lines.
///
/// Numbering is 1-based and continuous across headword blocks. With
/// `filter_subsenses` the nested senses are left out but the numbers of the
/// remaining senses do not change, so choices still address the full list.
pub fn render_entry(entry: &CanonicalEntry, options: &RenderOptions) -> Vec<String> {
    let palette = &options.palette;
    let width = options.width;
    let mut lines = Vec::new();

    let title = if options.filter_subsenses {
        format!("{} (filtered)", entry.source)
    } else {
        entry.source.clone()
    };
    lines.push(paint(&title_line(&title, width), palette.delimiter).to_string());

    let mut current_phrase: Option<usize> = None;
    let mut current_gram: Option<usize> = None;

    for (i, definition) in entry.definitions.iter().enumerate() {
        let phrase_block = entry.def_index_to_phrase_block.get(i).copied().unwrap_or(0);
        let gram_block = entry.def_index_to_gram_block.get(i).copied().unwrap_or(0);

        // --- Headword block header ---
        if current_phrase != Some(phrase_block) {
            if current_phrase.is_some() {
                lines.push(paint(&BAR.repeat(width), palette.delimiter).to_string());
            }
            let phrase = entry.phrases.get(phrase_block).map(String::as_str).unwrap_or_default();
            let phonetic = entry.phonetics.get(phrase_block).map(String::as_str).unwrap_or_default();
            if !phrase.is_empty() {
                lines.push(format!(
                    " {} {}",
                    paint(phrase, palette.phrase),
                    paint(phonetic, palette.phonetic)
                ).trim_end().to_string());
            }
            current_phrase = Some(phrase_block);
            current_gram = None;
        }

        // --- Grammatical block label ---
        if current_gram != Some(gram_block) {
            let label = entry
                .grammatical_labels
                .get(gram_block)
                .map(String::as_str)
                .unwrap_or_default();
            if !label.is_empty() {
                lines.push(String::new());
                lines.push(format!(" {}", paint(label, palette.label)));
            }
            current_gram = Some(gram_block);
        }

        // --- Definition and its example ---
        let subsense = entry.subsenses.get(i).copied().unwrap_or(false);
        if !(subsense && options.filter_subsenses) {
            push_definition(&mut lines, entry, i, definition, subsense, options);
        }

        // --- Etymology closes the headword block ---
        let next_block = entry.def_index_to_phrase_block.get(i + 1).copied();
        if next_block != Some(phrase_block) {
            let etymology = entry.etymologies.get(phrase_block).map(String::as_str).unwrap_or_default();
            if !etymology.is_empty() {
                lines.push(String::new());
                let wrapped = wrap_lines(etymology, options.style, width, 1, 1).join("\n");
                lines.push(format!(" {}", paint(&wrapped, palette.etym)));
            }
        }
    }

    lines
}

/// Odd-numbered definitions use `def1`, even-numbered ones `def2`.
fn definition_color(palette: &Palette, number: usize) -> Option<colored::Color> {
    if number % 2 == 1 { palette.def1 } else { palette.def2 }
}

fn push_definition(
    lines: &mut Vec<String>,
    entry: &CanonicalEntry,
    i: usize,
    definition: &str,
    subsense: bool,
    options: &RenderOptions,
) {
    let palette = &options.palette;
    let number = (i + 1).to_string();
    let number_len = number.len();
    let sign = if subsense { " " } else { ">" };
    let def_color = definition_color(palette, i + 1);

    let wrapped = wrap_lines(definition, options.style, options.width, number_len + 2, options.indent);
    lines.push(format!(
        "{}{} {}",
        paint(sign, palette.index),
        paint(&number, palette.index),
        paint(&wrapped.join("\n"), def_color)
    ));

    if !options.show_examples {
        return;
    }
    let example = entry.example_sentences.get(i).map(String::as_str).unwrap_or_default();
    if !example.is_empty() {
        let wrapped = wrap_lines(example, options.style, options.width, number_len + 4, options.indent);
        lines.push(format!(
            "{}  {}{}",
            " ".repeat(number_len),
            paint("- ", palette.index),
            paint(&wrapped.join("\n"), palette.example)
        ));
    }
}

/// Renders the finished card as a box, one section per non-empty field.
pub fn render_card_preview(fields: &CardFields, order: &[FieldName], options: &RenderOptions) -> Vec<String> {
    let width = options.width.max(MIN_TEXT_WIDTH);
    let inner = width - 4;
    let palette = &options.palette;

    let mut lines = vec![format!("┌{}┐", title_line("Card preview", width - 2))];
    for field in order {
        let content = fields.get(*field);
        if content.trim().is_empty() {
            continue;
        }
        let header = format!("{:<inner$}", field.as_str(), inner = inner);
        lines.push(format!("│ {} │", paint(&header, palette.label)));
        for paragraph in content.split("<br>") {
            for line in wrap_and_pad(paragraph.trim(), options.style, inner, 0, 0) {
                lines.push(format!("│ {} │", line));
            }
        }
    }
    lines.push(format!("└{}┘", BAR.repeat(width - 2)));
    lines
}
