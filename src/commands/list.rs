//! List command - show installed mods.
//!
//! Resolution runs entirely against the cache; a fresh profile with a cold
//! cache still lists every row, just with raw ids.

use anyhow::Result;
use clap::Args;

use super::open_app;
use crate::resolve::resolve_installed;
use crate::types::Repository;

#[derive(Args)]
pub struct ListCmd {
    /// Filter by repository
    #[arg(short, long)]
    pub repository: Option<Repository>,
}

impl ListCmd {
    pub async fn run(&self) -> Result<()> {
        let app = open_app().await?;

        let mut installed = app.db.list_installed().await?;
        if let Some(repository) = self.repository {
            installed.retain(|row| row.repository == repository.as_str());
        }

        if installed.is_empty() {
            println!("No mods installed. Run `modget install <mod>` first.");
            return Ok(());
        }

        let resolved = futures::future::join_all(
            installed.iter().map(|row| resolve_installed(&app.api, row)),
        )
        .await;

        for entry in &resolved {
            println!("{}", entry.line());
        }

        println!("\n{} mods installed", resolved.len());

        Ok(())
    }
}
