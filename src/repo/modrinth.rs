//! Modrinth registry adapter.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::client::RepoClient;
use super::error::RepoError;
use super::model::{
    CommonProjectResult, CommonProjectVersion, CommonVersionDependency, CommonVersionFile,
};
use crate::types::{MinecraftVersion, ProjectId, ProjectSlug, ReleaseType, Repository};

const MODRINTH_API: &str = "https://api.modrinth.com/v2";

/// Modrinth API client.
#[derive(Clone)]
pub struct ModrinthApi {
    client: Client,
    api_url: String,
}

impl ModrinthApi {
    pub fn new() -> Self {
        // Modrinth asks clients to identify themselves
        let client = Client::builder()
            .user_agent(concat!("modget/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build http client");

        Self {
            client,
            api_url: MODRINTH_API.to_string(),
        }
    }

    pub fn with_api_url(api_url: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
        }
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    async fn fetch_project(&self, id_or_slug: &str) -> Result<CommonProjectResult, RepoError> {
        let url = format!("{}/project/{}", self.api_url, id_or_slug);
        debug!(project = id_or_slug, url = %url, "fetching modrinth project");

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RepoError::NotFound(format!("modrinth/{}", id_or_slug)));
        }
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RepoError::RateLimited);
        }

        let project: Project = response.json().await?;
        Ok(project.convert())
    }
}

impl Default for ModrinthApi {
    fn default() -> Self {
        Self::new()
    }
}

// Modrinth v2 API response types
#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    project_id: String,
    slug: String,
    title: String,
    description: String,
    author: String,
    #[serde(default)]
    versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Project {
    id: String,
    slug: String,
    title: String,
    description: String,
    #[serde(default)]
    game_versions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Version {
    id: String,
    project_id: String,
    name: String,
    version_number: String,
    version_type: String,
    date_published: DateTime<Utc>,
    files: Vec<VersionFile>,
    #[serde(default)]
    dependencies: Vec<VersionDependency>,
    game_versions: Vec<String>,
    loaders: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VersionFile {
    url: String,
    filename: String,
    primary: bool,
    #[serde(default)]
    hashes: FileHashes,
}

#[derive(Debug, Deserialize, Default)]
struct FileHashes {
    sha512: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionDependency {
    project_id: Option<String>,
    version_id: Option<String>,
    dependency_type: String,
}

impl SearchHit {
    fn convert(self) -> CommonProjectResult {
        let latest_version = self
            .versions
            .iter()
            .filter_map(|v| MinecraftVersion::parse(v))
            .max();
        CommonProjectResult {
            id: ProjectId::new(Repository::Modrinth, self.project_id),
            slug: ProjectSlug::new(Repository::Modrinth, self.slug),
            name: self.title,
            author: Some(self.author),
            description: self.description,
            latest_version,
        }
    }
}

impl Project {
    fn convert(self) -> CommonProjectResult {
        let latest_version = self
            .game_versions
            .iter()
            .filter_map(|v| MinecraftVersion::parse(v))
            .max();
        CommonProjectResult {
            id: ProjectId::new(Repository::Modrinth, self.id),
            slug: ProjectSlug::new(Repository::Modrinth, self.slug),
            name: self.title,
            // the project endpoint only exposes a team id, not a display name
            author: None,
            description: self.description,
            latest_version,
        }
    }
}

impl Version {
    fn convert(self) -> Result<CommonProjectVersion, RepoError> {
        let release_type = match self.version_type.as_str() {
            "release" => ReleaseType::Release,
            "beta" => ReleaseType::Beta,
            "alpha" => ReleaseType::Alpha,
            other => {
                return Err(RepoError::Schema(format!(
                    "unknown Modrinth version type '{}'",
                    other
                )));
            }
        };

        Ok(CommonProjectVersion {
            id: self.id,
            project_id: ProjectId::new(Repository::Modrinth, self.project_id),
            name: self.name,
            number: self.version_number,
            release_type,
            date_published: self.date_published,
            // snapshots and other unrecognized strings drop out silently
            game_versions: self
                .game_versions
                .iter()
                .filter_map(|v| MinecraftVersion::parse(v))
                .collect(),
            loaders: self
                .loaders
                .into_iter()
                .map(|loader| loader.to_lowercase())
                .collect(),
            files: self
                .files
                .into_iter()
                .map(|file| CommonVersionFile {
                    name: file.filename,
                    url: file.url,
                    primary: file.primary,
                    sha512: file.hashes.sha512,
                })
                .collect(),
            dependencies: self
                .dependencies
                .into_iter()
                .map(|dep| CommonVersionDependency {
                    project_id: dep.project_id,
                    version_id: dep.version_id,
                    required: dep.dependency_type == "required",
                })
                .collect(),
        })
    }
}

impl RepoClient for ModrinthApi {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<CommonProjectResult>, RepoError> {
        let url = format!("{}/search", self.api_url);
        debug!(query, url = %url, "searching modrinth");

        let response = self
            .client
            .get(&url)
            .query(&[("query", query), ("limit", &limit.to_string())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RepoError::RateLimited);
        }

        let search: SearchResponse = response.json().await?;
        Ok(search.hits.into_iter().map(SearchHit::convert).collect())
    }

    async fn project(&self, id: &str) -> Result<CommonProjectResult, RepoError> {
        self.fetch_project(id).await
    }

    async fn project_by_slug(&self, slug: &str) -> Result<CommonProjectResult, RepoError> {
        // Modrinth resolves slugs and ids through the same endpoint
        self.fetch_project(slug).await
    }

    async fn project_versions(&self, id: &str) -> Result<Vec<CommonProjectVersion>, RepoError> {
        let url = format!("{}/project/{}/version", self.api_url, id);
        debug!(project = id, url = %url, "fetching modrinth versions");

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RepoError::NotFound(format!("modrinth/{}", id)));
        }
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RepoError::RateLimited);
        }

        let versions: Vec<Version> = response.json().await?;
        versions.into_iter().map(Version::convert).collect()
    }

    async fn version(&self, id: &str) -> Result<CommonProjectVersion, RepoError> {
        let url = format!("{}/version/{}", self.api_url, id);
        debug!(version = id, url = %url, "fetching modrinth version");

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RepoError::NotFound(format!("modrinth version {}", id)));
        }
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RepoError::RateLimited);
        }

        let version: Version = response.json().await?;
        version.convert()
    }
}
