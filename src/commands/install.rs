//! Install command - download a mod into the mods directory.

use std::io::Write;

use anyhow::{Context, Result, bail};
use clap::Args;
use sha2::{Digest, Sha512};
use tracing::{debug, warn};

use super::open_app;
use crate::local::models::CreateInstalled;
use crate::repo::{CachePolicy, CommonProjectResult, CommonProjectVersion, RepoApi};
use crate::types::{MinecraftVersion, ProjectSlug, ReleaseType, Repository};

#[derive(Args)]
pub struct InstallCmd {
    /// Mod to install, e.g. `sodium` or `modrinth/sodium`
    pub target: String,

    /// Game version to install for (default: configured game version)
    #[arg(short, long)]
    pub game_version: Option<String>,

    /// Mod loader to install for (default: configured loader)
    #[arg(short, long)]
    pub loader: Option<String>,
}

impl InstallCmd {
    pub async fn run(&self) -> Result<()> {
        let app = open_app().await?;

        let game_version = match self.game_version.as_ref().or(app.config.game_version.as_ref()) {
            Some(raw) => Some(
                MinecraftVersion::parse(raw)
                    .with_context(|| format!("not a game version: {}", raw))?,
            ),
            None => None,
        };
        let loader = self.loader.clone().unwrap_or_else(|| app.config.loader.clone());

        let project = find_project(&app.api, &self.target, CachePolicy::Normal).await?;
        let versions = app
            .api
            .project_versions(&project.id, CachePolicy::Normal)
            .await?
            .unwrap_or_default();

        let version = pick_version(&versions, game_version.as_ref(), &loader).with_context(|| {
            format!(
                "no version of {} matches game version {} and loader {}",
                project.slug,
                game_version.map_or_else(|| "any".to_string(), |v| v.to_string()),
                loader
            )
        })?;

        let file = version
            .primary_file()
            .with_context(|| format!("version {} has no files", version.number))?;

        println!("Installing {} ({})...", project.slug, version.number);
        let data = app.api.download(&file.url).await?;
        verify_sha512(&file.name, file.sha512.as_deref(), &data)?;

        let mods_dir = app.config.mods_dir()?;
        std::fs::create_dir_all(&mods_dir)
            .with_context(|| format!("failed to create {}", mods_dir.display()))?;
        write_artifact(&mods_dir, &file.name, &data)?;

        app.db
            .insert_installed(&CreateInstalled {
                repository: project.id.repository.as_str().to_string(),
                project_id: project.id.id.clone(),
                version_id: version.id.clone(),
                file_name: Some(file.name.clone()),
            })
            .await?;

        // make sure `modget list` can resolve this install without network
        app.api.prime_project(&project).await;
        app.api.prime_version(version).await;

        println!(
            "Installed {} ({}) into {}",
            project.slug,
            version.number,
            mods_dir.display()
        );

        Ok(())
    }
}

/// Look a project up by `repository/slug`, or try every repository for a
/// bare slug. Lookup failures on one repository (a missing CurseForge key,
/// say) degrade to a warning while the others are tried.
pub(crate) async fn find_project(
    api: &RepoApi,
    target: &str,
    policy: CachePolicy,
) -> Result<CommonProjectResult> {
    if let Ok(slug) = target.parse::<ProjectSlug>() {
        return api
            .project_by_slug(&slug, policy)
            .await?
            .with_context(|| format!("{} not found", slug));
    }

    for repository in Repository::ALL {
        let slug = ProjectSlug::new(repository, target);
        match api.project_by_slug(&slug, policy).await {
            Ok(Some(project)) => return Ok(project),
            Ok(None) => debug!(slug = %slug, "no such slug"),
            Err(err) => warn!(slug = %slug, error = %err, "lookup failed"),
        }
    }

    bail!("mod '{}' not found on any repository", target)
}

/// Pick the newest version compatible with the wanted game version and
/// loader, preferring stable releases over betas and alphas.
pub(crate) fn pick_version<'a>(
    versions: &'a [CommonProjectVersion],
    game_version: Option<&MinecraftVersion>,
    loader: &str,
) -> Option<&'a CommonProjectVersion> {
    let mut candidates: Vec<&CommonProjectVersion> = versions
        .iter()
        .filter(|version| {
            game_version.is_none_or(|wanted| version.game_versions.contains(wanted))
        })
        .filter(|version| {
            version.loaders.is_empty() || version.loaders.iter().any(|have| have == loader)
        })
        .collect();
    candidates.sort_by(|a, b| b.date_published.cmp(&a.date_published));

    candidates
        .iter()
        .find(|version| version.release_type == ReleaseType::Release)
        .copied()
        .or_else(|| candidates.first().copied())
}

pub(crate) fn verify_sha512(name: &str, expected: Option<&str>, data: &[u8]) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };
    let actual = hex::encode(Sha512::digest(data));
    if !actual.eq_ignore_ascii_case(expected) {
        bail!(
            "checksum mismatch for {}: expected {}, got {}",
            name,
            expected,
            actual
        );
    }
    Ok(())
}

/// Write the artifact next to its final location, then rename into place.
pub(crate) fn write_artifact(dir: &std::path::Path, name: &str, data: &[u8]) -> Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(data).context("failed to write artifact")?;
    tmp.persist(dir.join(name))
        .with_context(|| format!("failed to move artifact into {}", dir.display()))?;
    Ok(())
}
