//! Info command - show details for a single mod.

use anyhow::Result;
use clap::Args;

use super::install::find_project;
use super::open_app;
use crate::repo::CachePolicy;

/// How many recent versions to print.
const VERSION_LIMIT: usize = 5;

#[derive(Args)]
pub struct InfoCmd {
    /// Mod to show, e.g. `sodium` or `modrinth/sodium`
    pub target: String,

    /// Bypass cached data and refetch
    #[arg(long)]
    pub refresh: bool,
}

impl InfoCmd {
    pub async fn run(&self) -> Result<()> {
        let app = open_app().await?;

        let policy = if self.refresh {
            CachePolicy::ForceRefresh
        } else {
            CachePolicy::Normal
        };

        let project = find_project(&app.api, &self.target, policy).await?;

        println!("{}", project.slug);
        println!("  name:        {}", project.name);
        if let Some(author) = &project.author {
            println!("  author:      {}", author);
        }
        if let Some(version) = &project.latest_version {
            println!("  latest for:  {}", version);
        }
        println!("  id:          {}", project.id.id);
        println!("  description: {}", project.description);

        let versions = app
            .api
            .project_versions(&project.id, policy)
            .await?
            .unwrap_or_default();

        if versions.is_empty() {
            return Ok(());
        }

        println!("\nRecent versions:");
        let mut versions = versions;
        versions.sort_by(|a, b| b.date_published.cmp(&a.date_published));
        for version in versions.iter().take(VERSION_LIMIT) {
            let game_versions: Vec<String> = version
                .game_versions
                .iter()
                .map(|v| v.to_string())
                .collect();
            println!(
                "  {} [{}] {} ({})",
                version.number,
                version.release_type,
                game_versions.join(", "),
                version.loaders.join(", "),
            );
        }

        Ok(())
    }
}
