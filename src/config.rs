use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use usbwatch::tables::TableKind;

/// Inspect a decoded USB capture in the terminal.
#[derive(Debug, Parser)]
#[command(name = "usbwatch", version, about)]
pub struct Config {
    /// Decoded capture snapshot (JSON) produced by the capture backend.
    pub capture: PathBuf,

    /// View shown on start-up.
    #[arg(long, value_enum, default_value_t = View::Tree)]
    pub view: View,

    /// Redraw interval for the header clock, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub tick_ms: u64,

    /// Write logs here (the terminal belongs to the UI). Filter with RUST_LOG.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Print a view as tab-separated text and exit instead of starting the UI.
    #[arg(long, value_enum)]
    pub dump: Option<View>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum View {
    Tree,
    Packets,
    Transactions,
    Transfers,
    Events,
}

impl View {
    pub fn table(self) -> Option<TableKind> {
        match self {
            View::Tree => None,
            View::Packets => Some(TableKind::Packets),
            View::Transactions => Some(TableKind::Transactions),
            View::Transfers => Some(TableKind::Transfers),
            View::Events => Some(TableKind::Events),
        }
    }
}
