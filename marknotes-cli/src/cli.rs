use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use marknotes_core::{ExportFormat, Theme};

#[derive(Parser, Debug)]
#[command(name = "marknotes")]
#[command(version, about = "Local-first Markdown notes")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the notes store (overrides the settings file)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Keep notes in memory only; nothing is read from or written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List notes, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a note's Markdown
    Show {
        /// Note ID or unique ID prefix
        id: String,
    },

    /// Create a new note
    New {
        /// Note title
        #[arg(long, short = 't')]
        title: Option<String>,

        /// Note content
        #[arg(long, short = 'c')]
        content: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a note's title or content
    Edit {
        /// Note ID or unique ID prefix
        id: String,

        /// New title
        #[arg(long, short = 't')]
        title: Option<String>,

        /// New content
        #[arg(long, short = 'c', conflicts_with = "stdin")]
        content: Option<String>,

        /// Read new content from stdin
        #[arg(long)]
        stdin: bool,
    },

    /// Delete a note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },

    /// Print a note rendered as HTML
    Preview {
        /// Note ID or unique ID prefix
        id: String,
    },

    /// Export a note as a Markdown or PDF file
    Export {
        /// Note ID or unique ID prefix
        id: String,

        /// Output format
        #[arg(long, short = 'f', value_enum, default_value_t = FormatArg::Markdown)]
        format: FormatArg,

        /// Output directory (defaults to the export directory from settings)
        #[arg(long, short = 'o', value_name = "DIR")]
        out: Option<PathBuf>,
    },

    /// Show or change the colour theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Interactive editing session
    Shell,
}

#[derive(Subcommand, Debug)]
pub enum ThemeAction {
    /// Print the active theme
    Show,
    /// Switch between light and dark
    Toggle,
    /// Choose a theme
    Set {
        #[arg(value_enum)]
        theme: ThemeArg,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the settings file location and values
    Show,
    /// Change one setting
    Set {
        #[arg(value_enum)]
        key: ConfigKey,
        value: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    #[value(alias = "md")]
    Markdown,
    Pdf,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Markdown => ExportFormat::Markdown,
            FormatArg::Pdf => ExportFormat::Pdf,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigKey {
    DataDirectory,
    ExportDirectory,
    PrefersDark,
}
