use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version = env!("CARGO_PKG_VERSION"),
    about = "texpand - expand abbreviations as you type",
    long_about = "texpand watches the word you are typing and replaces registered abbreviations with their snippet text when you press space, tab or enter."
)]
pub struct Texpand {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Add a new snippet
    Add {
        #[arg(long, short = 'k', help = "Abbreviation that triggers the snippet")]
        keyword: String,

        #[arg(long, short = 'c', help = "Replacement text")]
        content: String,
    },
    /// Replace the content of an existing snippet
    Update {
        #[arg(long, short = 'k', help = "Keyword of the snippet to update")]
        keyword: String,

        #[arg(long, short = 'c', help = "New replacement text")]
        content: String,
    },
    /// Delete a snippet by keyword
    Delete {
        #[arg(long, short = 'k', help = "Keyword of the snippet to delete")]
        keyword: String,
    },
    /// List snippets, most used first
    List {
        #[arg(long, conflicts_with = "recent", help = "Only the N most used snippets")]
        top: Option<usize>,

        #[arg(long, help = "Only the N most recently used snippets")]
        recent: Option<usize>,
    },
    /// Search keywords and content
    Search { text: String },
    /// Show usage statistics
    Stats,
    /// Import snippets from a JSON object of keyword to content
    Import { file: PathBuf },
    /// Export snippets as a JSON object of keyword to content
    Export { file: PathBuf },
    /// Copy the snippet file to another location
    Backup { path: PathBuf },
    /// Start the expansion daemon
    Start {
        #[arg(long, short, help = "Port for the control server")]
        port: Option<u16>,
    },
    /// Stop the expansion daemon
    Stop,
    /// Check the status of the daemon
    Status,
    /// Turn expansion on or off in the running daemon
    Toggle,
    // Hidden command used to run the daemon worker in the foreground
    #[command(hide = true)]
    DaemonWorker {
        #[arg(long, short)]
        port: Option<u16>,
    },
}
