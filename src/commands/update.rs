//! Update command - move installed mods to newer compatible versions.
//!
//! Version lists are always refetched (`ForceRefresh`): update is the one
//! command whose entire point is seeing what changed upstream. A failure on
//! one installed mod degrades to a warning; the rest still update.

use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use super::install::{pick_version, verify_sha512, write_artifact};
use super::open_app;
use crate::repo::{CachePolicy, CommonProjectVersion};
use crate::resolve::resolve_installed;
use crate::types::{MinecraftVersion, ProjectId, Repository};

#[derive(Args)]
pub struct UpdateCmd {
    /// Report available updates without installing them
    #[arg(long)]
    pub dry_run: bool,
}

impl UpdateCmd {
    pub async fn run(&self) -> Result<()> {
        let app = open_app().await?;

        let installed = app.db.list_installed().await?;
        if installed.is_empty() {
            println!("No mods installed.");
            return Ok(());
        }

        let game_version = match &app.config.game_version {
            Some(raw) => Some(
                MinecraftVersion::parse(raw)
                    .with_context(|| format!("configured game version is invalid: {}", raw))?,
            ),
            None => None,
        };

        let mut updated = 0usize;
        for row in installed {
            let resolved = resolve_installed(&app.api, &row).await;

            let Ok(repository) = row.repository.parse::<Repository>() else {
                warn!(repository = %row.repository, "skipping row with unknown repository");
                continue;
            };
            let project_id = ProjectId::new(repository, row.project_id.clone());

            let versions = match app
                .api
                .project_versions(&project_id, CachePolicy::ForceRefresh)
                .await
            {
                Ok(Some(versions)) => versions,
                Ok(None) => {
                    warn!(project = %resolved.project, "project no longer exists upstream");
                    continue;
                }
                Err(err) => {
                    warn!(project = %resolved.project, error = %err, "update check failed");
                    continue;
                }
            };

            let Some(candidate) =
                pick_version(&versions, game_version.as_ref(), &app.config.loader)
            else {
                continue;
            };
            if !is_newer(candidate, &versions, &row.version_id) {
                continue;
            }

            if self.dry_run {
                println!("{}: {} available", resolved.line(), candidate.number);
                continue;
            }

            match install_update(&app, &row, candidate).await {
                Ok(()) => {
                    println!("Updated {} -> {}", resolved.line(), candidate.number);
                    updated += 1;
                }
                Err(err) => warn!(project = %resolved.project, error = %err, "update failed"),
            }
        }

        if !self.dry_run {
            println!("\n{} mods updated", updated);
        }

        Ok(())
    }
}

/// A candidate counts as newer when it differs from the installed version id
/// and was published after it. An installed version that vanished from the
/// upstream list counts as outdated.
fn is_newer(
    candidate: &CommonProjectVersion,
    versions: &[CommonProjectVersion],
    installed_version_id: &str,
) -> bool {
    if candidate.id == installed_version_id {
        return false;
    }
    match versions.iter().find(|v| v.id == installed_version_id) {
        Some(current) => candidate.date_published > current.date_published,
        None => true,
    }
}

async fn install_update(
    app: &super::App,
    row: &crate::local::models::InstalledProjectRow,
    candidate: &CommonProjectVersion,
) -> Result<()> {
    let file = candidate
        .primary_file()
        .with_context(|| format!("version {} has no files", candidate.number))?;

    let data = app.api.download(&file.url).await?;
    verify_sha512(&file.name, file.sha512.as_deref(), &data)?;

    let mods_dir = app.config.mods_dir()?;
    std::fs::create_dir_all(&mods_dir)
        .with_context(|| format!("failed to create {}", mods_dir.display()))?;
    write_artifact(&mods_dir, &file.name, &data)?;

    // drop the previous artifact if the file name changed
    if let Some(old_name) = &row.file_name {
        if old_name != &file.name {
            let old_path = mods_dir.join(old_name);
            if let Err(err) = std::fs::remove_file(&old_path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    warn!(path = %old_path.display(), error = %err, "failed to remove old artifact");
                }
            }
        }
    }

    app.db
        .update_installed_version(&row.id, &candidate.id, Some(&file.name))
        .await?;
    app.api.prime_version(candidate).await;

    Ok(())
}
