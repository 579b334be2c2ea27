//! Search command - find mods across Modrinth and CurseForge.

use anyhow::Result;
use clap::Args;

use super::open_app;
use crate::repo::{CachePolicy, CommonProjectResult};
use crate::types::Repository;

#[derive(Args)]
pub struct SearchCmd {
    /// Search query
    pub query: String,

    /// Restrict to one repository
    #[arg(short, long)]
    pub repository: Option<Repository>,

    /// Max results per repository
    #[arg(short, long, default_value = "10")]
    pub limit: u32,

    /// Bypass cached results and refetch
    #[arg(long)]
    pub refresh: bool,
}

impl SearchCmd {
    pub async fn run(&self) -> Result<()> {
        let app = open_app().await?;

        let policy = if self.refresh {
            CachePolicy::ForceRefresh
        } else {
            CachePolicy::Normal
        };

        let response = app
            .api
            .search(&self.query, self.repository, self.limit, policy)
            .await?;

        for failure in &response.failures {
            eprintln!(
                "warning: {} search failed: {}",
                failure.repository.display_name(),
                failure.error
            );
        }

        if response.hits.is_empty() {
            println!("No mods found for '{}'.", self.query);
            return Ok(());
        }

        for hit in &response.hits {
            println!("{}", format_project(hit));
        }

        Ok(())
    }
}

fn format_project(project: &CommonProjectResult) -> String {
    let mut line = project.slug.to_string();
    if let Some(version) = &project.latest_version {
        line.push_str(&format!(" {}", version));
    }
    if let Some(author) = &project.author {
        line.push_str(&format!(" by {}", author));
    }
    format!("{}\n  {}", line, project.description)
}
