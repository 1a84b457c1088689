//! Command-line interface.

use clap::{Parser, Subcommand};

/// Pressroom - article publishing API with role-based access control
#[derive(Parser)]
#[command(name = "pressroom")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the HTTP API (default)
    #[command(alias = "s")]
    Serve,

    /// Seed the permission catalog and root account, then exit
    Seed,
}

impl Cli {
    #[must_use]
    pub fn command(&self) -> Commands {
        self.command.unwrap_or(Commands::Serve)
    }
}
