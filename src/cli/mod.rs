use clap::Parser;
use std::path::PathBuf;

pub mod dispatcher;
pub mod handlers;
pub mod session;

/// Replaces the semantic tags of a message template (`<title>`, `<cmd>`, ...)
/// with terminal colors, or removes them when colors are off.
pub fn render_tags(template: &str) -> String {
    let use_colors = colored::control::SHOULD_COLORIZE.should_colorize();

    // If colors are disabled, the tags become empty strings.
    let title = if use_colors { "\x1b[1;33m" } else { "" }; // Bold Yellow
    let hl = if use_colors { "\x1b[1;36m" } else { "" }; // Bold Cyan
    let cmd = if use_colors { "\x1b[36m" } else { "" }; // Cyan
    let group = if use_colors { "\x1b[1;32m" } else { "" }; // Bold Green
    let dim = if use_colors { "\x1b[2m" } else { "" };
    let reset = if use_colors { "\x1b[0m" } else { "" };

    template
        .replace("<title>", title)
        .replace("</title>", reset)
        .replace("<hl>", hl)
        .replace("</hl>", reset)
        .replace("<cmd>", cmd)
        .replace("</cmd>", reset)
        .replace("<group>", group)
        .replace("</group>", reset)
        .replace("<dim>", dim)
        .replace("</dim>", reset)
}

/// Builds the color-aware `--help` text for clap.
pub fn build_help_string() -> &'static str {
    Box::leak(render_tags(t!("cli.help.template")).into_boxed_str())
}

/// cardsmith: dictionary lookups turned into flashcards.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    help_template = { build_help_string() },
    styles = clap::builder::Styles::styled()
        .header(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .usage(clap::builder::styling::AnsiColor::Yellow.on_default().bold())
        .literal(clap::builder::styling::AnsiColor::Cyan.on_default().bold())
        .placeholder(clap::builder::styling::AnsiColor::Green.on_default()),
)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    /// Reads queries from FILE and creates a card for each, without prompting.
    #[arg(long, value_name = "FILE")]
    pub bulk: Option<PathBuf>,

    /// Separates the queries of a bulk file. Defaults to a newline.
    #[arg(long, value_name = "SEP")]
    pub separator: Option<String>,

    /// Disables colored output.
    #[arg(long)]
    pub no_color: bool,

    /// A first query, run before the interactive prompt opens.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub query: Vec<String>,
}
