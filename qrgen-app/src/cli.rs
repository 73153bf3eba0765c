//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use qrgen_core::config::{DEFAULT_BACKGROUND, DEFAULT_FOREGROUND};
use qrgen_core::storage::DEFAULT_CAPACITY;
use qrgen_core::{EntryId, ThemePreference};
use qrgen_renderer::ExportFormat;

/// Command-line arguments for `qrgen`.
#[derive(Debug, Clone, Parser)]
#[command(name = "qrgen")]
#[command(about = "Generate QR codes and keep a history of them")]
#[command(version)]
pub struct CliArgs {
    /// Directory for persisted state (defaults to the platform data dir)
    #[arg(long, env = "QRGEN_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Treat the environment as preferring a dark color scheme
    #[arg(long, env = "QRGEN_PREFERS_DARK", global = true)]
    pub prefers_dark: bool,

    /// Storage capacity in bytes
    #[arg(long, default_value_t = DEFAULT_CAPACITY, global = true)]
    pub storage_quota: usize,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render a QR code to a file
    Generate(GenerateArgs),
    /// Inspect or modify the saved history
    #[command(subcommand)]
    History(HistoryCommand),
    /// Read or change the theme preference
    #[command(subcommand)]
    Theme(ThemeCommand),
    /// History panel layout
    #[command(subcommand)]
    Panel(PanelCommand),
}

/// Arguments for `generate`.
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Text or URL to encode
    pub text: String,

    /// Module color
    #[arg(long, default_value = DEFAULT_FOREGROUND)]
    pub fg: String,

    /// Background color
    #[arg(long, default_value = DEFAULT_BACKGROUND)]
    pub bg: String,

    /// Output format
    #[arg(long, value_enum, default_value_t = FormatArg::Svg)]
    pub format: FormatArg,

    /// Output directory
    #[arg(long, default_value = ".")]
    pub out: PathBuf,

    /// Also save the configuration to history
    #[arg(long)]
    pub save: bool,
}

/// Output format as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// SVG vector image
    Svg,
    /// 1024x1024 PNG
    Png,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Svg => Self::Svg,
            FormatArg::Png => Self::Png,
        }
    }
}

/// `history` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum HistoryCommand {
    /// List entries, newest first
    List {
        /// Case-insensitive substring filter
        #[arg(long)]
        search: Option<String>,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every entry
    Clear,
    /// Load an entry into the editor and print it
    Load {
        /// Entry ID
        id: EntryId,
    },
}

/// `theme` subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum ThemeCommand {
    /// Print the preference and the resolved theme
    Get,
    /// Change the preference
    Set {
        /// light, dark, or system
        preference: ThemePreference,
    },
}

/// `panel` subcommands.
#[derive(Debug, Clone, Copy, Subcommand)]
pub enum PanelCommand {
    /// Collapse or expand the history panel
    Toggle,
}
