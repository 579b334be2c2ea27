//! CLI argument definitions.

use clap::{Parser, Subcommand};

use crate::commands::{
    CleanCmd, ConfigCmd, InfoCmd, InstallCmd, ListCmd, RemoveCmd, SearchCmd, UpdateCmd,
};

#[derive(Parser)]
#[command(name = "modget")]
#[command(about = "modget - a package manager for Minecraft mods")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Search for mods on Modrinth and CurseForge
    Search(SearchCmd),

    /// Install a mod into the mods directory
    Install(InstallCmd),

    /// List installed mods
    List(ListCmd),

    /// Show details for a single mod
    Info(InfoCmd),

    /// Remove an installed mod
    Remove(RemoveCmd),

    /// Update installed mods to newer compatible versions
    Update(UpdateCmd),

    /// Manage configuration (mods directory, API keys, ...)
    Config(ConfigCmd),

    /// Clear cached repository responses
    Clean(CleanCmd),
}

impl Command {
    pub async fn execute(&self) -> anyhow::Result<()> {
        match self {
            Command::Search(cmd) => cmd.run().await,
            Command::Install(cmd) => cmd.run().await,
            Command::List(cmd) => cmd.run().await,
            Command::Info(cmd) => cmd.run().await,
            Command::Remove(cmd) => cmd.run().await,
            Command::Update(cmd) => cmd.run().await,
            Command::Config(cmd) => cmd.run().await,
            Command::Clean(cmd) => cmd.run().await,
        }
    }
}
