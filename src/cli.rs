use clap::{Parser, Subcommand};

/// Harvests Times Car stations into the station store and serves them back
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Fetch every station once and upsert it (the default)
    #[default]
    Harvest,
    /// Serve the stored stations over HTTP
    Serve,
}
