//! Installed-project resolution for display.
//!
//! Listing installed mods must stay instantaneous, so every lookup here runs
//! with [`CachePolicy::OnlyCached`] and independently degrades to raw ids on
//! a miss. The result is always producible, never an error.

use crate::local::models::InstalledProjectRow;
use crate::repo::{CachePolicy, RepoApi};
use crate::types::{ProjectId, Repository};

/// Human-presentable strings for one installed mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstalled {
    /// `repository/slug`, or `repository/raw-id` when project info is not
    /// cached.
    pub project: String,
    /// Version number, or the raw version id when the version is not cached.
    pub version: String,
}

impl ResolvedInstalled {
    pub fn line(&self) -> String {
        format!("{} ({})", self.project, self.version)
    }
}

/// Resolve one installed record to display strings.
///
/// Project and version lookups run concurrently; each falls back on its own,
/// so a missing version entry does not degrade an otherwise-resolvable
/// project name (and vice versa).
pub async fn resolve_installed(api: &RepoApi, installed: &InstalledProjectRow) -> ResolvedInstalled {
    let Ok(repository) = installed.repository.parse::<Repository>() else {
        // row written by a newer build; show it raw rather than fail the listing
        return ResolvedInstalled {
            project: format!("{}/{}", installed.repository, installed.project_id),
            version: installed.version_id.clone(),
        };
    };
    let project_id = ProjectId::new(repository, installed.project_id.clone());

    let (project, version) = tokio::join!(
        api.basic_project_info(&project_id, CachePolicy::OnlyCached),
        api.project_version(&installed.version_id, repository, CachePolicy::OnlyCached),
    );

    let project = project
        .ok()
        .flatten()
        .map(|project| project.slug.to_string())
        .unwrap_or_else(|| project_id.to_string());
    let version = version
        .ok()
        .flatten()
        .map(|version| version.number)
        .unwrap_or_else(|| installed.version_id.clone());

    ResolvedInstalled { project, version }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Utc;

    use crate::repo::{
        CacheStore, CommonProjectResult, CommonProjectVersion, CurseforgeApi, ModrinthApi,
        RequestContext,
    };
    use crate::types::{ProjectSlug, ReleaseType};

    fn offline_api() -> RepoApi {
        // adapters pointed at a closed port: any network attempt fails loudly
        RepoApi::with_clients(
            ModrinthApi::with_api_url("http://127.0.0.1:9".to_string()),
            CurseforgeApi::with_api_url("http://127.0.0.1:9".to_string(), None),
            RequestContext::new(CacheStore::memory(), Duration::from_secs(3600)),
        )
    }

    fn installed_row() -> InstalledProjectRow {
        InstalledProjectRow {
            id: "row-1".to_string(),
            repository: "modrinth".to_string(),
            project_id: "AANobbMI".to_string(),
            version_id: "Yp8wLY1P".to_string(),
            file_name: Some("sodium-fabric.jar".to_string()),
            installed_at: Utc::now().to_rfc3339(),
        }
    }

    fn sample_project() -> CommonProjectResult {
        CommonProjectResult {
            id: ProjectId::new(Repository::Modrinth, "AANobbMI"),
            slug: ProjectSlug::new(Repository::Modrinth, "sodium"),
            name: "Sodium".to_string(),
            author: Some("jellysquid3".to_string()),
            description: "A modern rendering engine".to_string(),
            latest_version: None,
        }
    }

    fn sample_version() -> CommonProjectVersion {
        CommonProjectVersion {
            id: "Yp8wLY1P".to_string(),
            project_id: ProjectId::new(Repository::Modrinth, "AANobbMI"),
            name: "Sodium 0.4.10".to_string(),
            number: "0.4.10".to_string(),
            release_type: ReleaseType::Release,
            date_published: Utc::now(),
            game_versions: vec![],
            loaders: vec!["fabric".to_string()],
            files: vec![],
            dependencies: vec![],
        }
    }

    #[tokio::test]
    async fn test_full_cache_miss_falls_back_to_raw_ids() {
        let api = offline_api();

        let resolved = resolve_installed(&api, &installed_row()).await;

        assert_eq!(resolved.project, "modrinth/AANobbMI");
        assert_eq!(resolved.version, "Yp8wLY1P");
    }

    #[tokio::test]
    async fn test_project_resolves_while_version_falls_back() {
        let api = offline_api();
        api.prime_project(&sample_project()).await;

        let resolved = resolve_installed(&api, &installed_row()).await;

        assert_eq!(resolved.project, "modrinth/sodium");
        assert_eq!(resolved.version, "Yp8wLY1P");
    }

    #[tokio::test]
    async fn test_fully_cached_resolution() {
        let api = offline_api();
        api.prime_project(&sample_project()).await;
        api.prime_version(&sample_version()).await;

        let resolved = resolve_installed(&api, &installed_row()).await;

        assert_eq!(resolved.project, "modrinth/sodium");
        assert_eq!(resolved.version, "0.4.10");
        assert_eq!(resolved.line(), "modrinth/sodium (0.4.10)");
    }

    #[tokio::test]
    async fn test_unknown_repository_shows_raw_record() {
        let api = offline_api();
        let mut row = installed_row();
        row.repository = "futurerepo".to_string();

        let resolved = resolve_installed(&api, &row).await;

        assert_eq!(resolved.project, "futurerepo/AANobbMI");
        assert_eq!(resolved.version, "Yp8wLY1P");
    }
}
