use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "credseal",
    about = "Keep credential files encrypted at rest",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Credential file (overrides `file` in config.toml).
    #[arg(long, global = true)]
    pub file: Option<PathBuf>,
    /// Protection purpose; must match the one the file was sealed with.
    #[arg(long, global = true)]
    pub purpose: Option<String>,
    /// Marker seed (defaults to "2x2").
    #[arg(long, global = true)]
    pub marker: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Load the credential file, sealing plaintext fields, and print it.
    Show {
        /// Print the password instead of a mask.
        #[arg(long)]
        reveal: bool,
    },
    /// Seal plaintext fields in place and report what changed.
    Seal,
    /// Run a protect/unprotect round trip for the configured purpose.
    Health,
    /// Print version and exit.
    Version,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}
