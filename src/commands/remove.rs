//! Remove command - uninstall a mod.

use anyhow::{Context, Result};
use clap::Args;

use super::open_app;
use crate::local::models::InstalledProjectRow;
use crate::resolve::{ResolvedInstalled, resolve_installed};

#[derive(Args)]
pub struct RemoveCmd {
    /// Installed mod to remove: slug, `repository/slug`, or raw project id
    pub target: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl RemoveCmd {
    pub async fn run(&self) -> Result<()> {
        let app = open_app().await?;

        let installed = app.db.list_installed().await?;

        let mut matched: Option<(InstalledProjectRow, ResolvedInstalled)> = None;
        for row in installed {
            let resolved = resolve_installed(&app.api, &row).await;
            if matches_target(&row, &resolved, &self.target) {
                matched = Some((row, resolved));
                break;
            }
        }

        let (row, resolved) = matched.with_context(|| {
            format!(
                "'{}' is not installed (try `modget list` to see what is)",
                self.target
            )
        })?;

        if !self.yes {
            println!("Remove {}?", resolved.line());
            print!("[y/N] ");
            std::io::Write::flush(&mut std::io::stdout())?;

            let mut input = String::new();
            std::io::stdin().read_line(&mut input)?;

            if !input.trim().eq_ignore_ascii_case("y") {
                println!("Aborted.");
                return Ok(());
            }
        }

        if let Some(file_name) = &row.file_name {
            let path = app.config.mods_dir()?.join(file_name);
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("failed to remove {}", path.display()));
                }
            }
        }

        app.db.remove_installed(&row.id).await?;

        println!("Removed {}", resolved.line());

        Ok(())
    }
}

/// Match an installed row against what the user typed: the resolved
/// `repository/slug`, the bare slug, or the raw project id all work.
fn matches_target(row: &InstalledProjectRow, resolved: &ResolvedInstalled, target: &str) -> bool {
    if row.project_id == target || resolved.project == target {
        return true;
    }
    resolved
        .project
        .split_once('/')
        .is_some_and(|(_, slug)| slug == target)
}
