//! CurseForge marketplace adapter.
//!
//! The v1 API wants an `x-api-key` header on every request; the key comes
//! from the local config. Without one, every call fails with
//! [`RepoError::MissingApiKey`], which multi-repository search reports as a
//! partial failure instead of aborting.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use super::client::RepoClient;
use super::error::RepoError;
use super::model::{
    CommonProjectResult, CommonProjectVersion, CommonVersionDependency, CommonVersionFile,
};
use crate::types::{MinecraftVersion, ProjectId, ProjectSlug, ReleaseType, Repository};

const CURSEFORGE_API: &str = "https://api.curseforge.com/v1";

/// Minecraft's game id in the CurseForge API.
const GAME_ID_MINECRAFT: u32 = 432;

/// Class id of the "Mods" section.
const CLASS_ID_MODS: u32 = 6;

/// `fileDependencies.relationType` value for a required dependency.
const RELATION_REQUIRED: u8 = 3;

/// Loader names CurseForge mixes into its game-version lists.
const KNOWN_LOADERS: &[&str] = &[
    "forge",
    "fabric",
    "quilt",
    "neoforge",
    "liteloader",
    "rift",
    "cauldron",
];

/// CurseForge API client.
#[derive(Clone)]
pub struct CurseforgeApi {
    client: Client,
    api_url: String,
    api_key: Option<Arc<SecretString>>,
}

impl CurseforgeApi {
    pub fn new(api_key: Option<SecretString>) -> Self {
        let client = Client::builder()
            .user_agent(concat!("modget/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build http client");

        Self {
            client,
            api_url: CURSEFORGE_API.to_string(),
            api_key: api_key.map(Arc::new),
        }
    }

    pub fn with_api_url(api_url: String, api_key: Option<SecretString>) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key: api_key.map(Arc::new),
        }
    }

    fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, RepoError> {
        let key = self.api_key.as_ref().ok_or(RepoError::MissingApiKey)?;
        Ok(self
            .client
            .get(url)
            .header("x-api-key", key.expose_secret()))
    }

    fn post(&self, url: &str) -> Result<reqwest::RequestBuilder, RepoError> {
        let key = self.api_key.as_ref().ok_or(RepoError::MissingApiKey)?;
        Ok(self
            .client
            .post(url)
            .header("x-api-key", key.expose_secret()))
    }
}

// CurseForge v1 API response types
#[derive(Debug, Deserialize)]
struct DataResponse<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Mod {
    id: u64,
    slug: String,
    name: String,
    summary: String,
    #[serde(default)]
    authors: Vec<Author>,
    #[serde(default)]
    latest_files_indexes: Vec<FileIndex>,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileIndex {
    game_version: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct File {
    id: u64,
    mod_id: u64,
    display_name: String,
    file_name: String,
    release_type: u8,
    file_date: DateTime<Utc>,
    download_url: Option<String>,
    #[serde(default)]
    game_versions: Vec<String>,
    #[serde(default)]
    dependencies: Vec<FileDependency>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileDependency {
    mod_id: u64,
    relation_type: u8,
}

impl Mod {
    fn convert(self) -> CommonProjectResult {
        let latest_version = self
            .latest_files_indexes
            .iter()
            .filter_map(|index| MinecraftVersion::parse(&index.game_version))
            .max();
        CommonProjectResult {
            id: ProjectId::new(Repository::Curseforge, self.id.to_string()),
            slug: ProjectSlug::new(Repository::Curseforge, self.slug),
            name: self.name,
            author: self.authors.into_iter().next().map(|author| author.name),
            description: self.summary,
            latest_version,
        }
    }
}

impl File {
    /// A CurseForge file is its own version: the converted record carries a
    /// single file, primary by convention.
    fn convert(self) -> Result<CommonProjectVersion, RepoError> {
        let release_type = match self.release_type {
            1 => ReleaseType::Release,
            2 => ReleaseType::Beta,
            3 => ReleaseType::Alpha,
            other => {
                return Err(RepoError::Schema(format!(
                    "unknown CurseForge release type {}",
                    other
                )));
            }
        };

        // gameVersions mixes loader names and game versions; split them and
        // drop anything we recognize as neither
        let mut loaders = Vec::new();
        let mut game_versions = Vec::new();
        for value in &self.game_versions {
            let lower = value.to_lowercase();
            if KNOWN_LOADERS.contains(&lower.as_str()) {
                loaders.push(lower);
            } else if let Some(version) = MinecraftVersion::parse(value) {
                game_versions.push(version);
            }
        }

        // files with distribution disabled omit the url; the CDN layout is
        // deterministic from the file id
        let url = self.download_url.unwrap_or_else(|| {
            format!(
                "https://edge.forgecdn.net/files/{}/{}/{}",
                self.id / 1000,
                self.id % 1000,
                self.file_name
            )
        });

        Ok(CommonProjectVersion {
            id: self.id.to_string(),
            project_id: ProjectId::new(Repository::Curseforge, self.mod_id.to_string()),
            name: self.display_name.clone(),
            number: self.display_name,
            release_type,
            date_published: self.file_date,
            game_versions,
            loaders,
            files: vec![CommonVersionFile {
                name: self.file_name,
                url,
                primary: true,
                // CurseForge only publishes sha1/md5
                sha512: None,
            }],
            dependencies: self
                .dependencies
                .into_iter()
                .map(|dep| CommonVersionDependency {
                    project_id: Some(dep.mod_id.to_string()),
                    version_id: None,
                    required: dep.relation_type == RELATION_REQUIRED,
                })
                .collect(),
        })
    }
}

impl RepoClient for CurseforgeApi {
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<CommonProjectResult>, RepoError> {
        let url = format!("{}/mods/search", self.api_url);
        debug!(query, url = %url, "searching curseforge");

        let response = self
            .get(&url)?
            .query(&[
                ("gameId", GAME_ID_MINECRAFT.to_string()),
                ("classId", CLASS_ID_MODS.to_string()),
                ("searchFilter", query.to_string()),
                ("pageSize", limit.to_string()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RepoError::RateLimited);
        }

        let mods: DataResponse<Vec<Mod>> = response.json().await?;
        Ok(mods.data.into_iter().map(Mod::convert).collect())
    }

    async fn project(&self, id: &str) -> Result<CommonProjectResult, RepoError> {
        let url = format!("{}/mods/{}", self.api_url, id);
        debug!(project = id, url = %url, "fetching curseforge mod");

        let response = self.get(&url)?.send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RepoError::NotFound(format!("curseforge/{}", id)));
        }
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RepoError::RateLimited);
        }

        let result: DataResponse<Mod> = response.json().await?;
        Ok(result.data.convert())
    }

    async fn project_by_slug(&self, slug: &str) -> Result<CommonProjectResult, RepoError> {
        // no direct slug endpoint; filter the search results for an exact hit
        let url = format!("{}/mods/search", self.api_url);
        debug!(slug, url = %url, "looking up curseforge mod by slug");

        let response = self
            .get(&url)?
            .query(&[
                ("gameId", GAME_ID_MINECRAFT.to_string()),
                ("classId", CLASS_ID_MODS.to_string()),
                ("slug", slug.to_string()),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RepoError::RateLimited);
        }

        let mods: DataResponse<Vec<Mod>> = response.json().await?;
        mods.data
            .into_iter()
            .find(|entry| entry.slug == slug)
            .map(Mod::convert)
            .ok_or_else(|| RepoError::NotFound(format!("curseforge/{}", slug)))
    }

    async fn project_versions(&self, id: &str) -> Result<Vec<CommonProjectVersion>, RepoError> {
        let url = format!("{}/mods/{}/files", self.api_url, id);
        debug!(project = id, url = %url, "fetching curseforge files");

        let response = self
            .get(&url)?
            .query(&[("pageSize", "50")])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(RepoError::NotFound(format!("curseforge/{}", id)));
        }
        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RepoError::RateLimited);
        }

        let files: DataResponse<Vec<File>> = response.json().await?;
        files.data.into_iter().map(File::convert).collect()
    }

    async fn version(&self, id: &str) -> Result<CommonProjectVersion, RepoError> {
        let file_id: u64 = id
            .parse()
            .map_err(|_| RepoError::NotFound(format!("curseforge file {}", id)))?;

        // files are addressable without their mod id through the batch endpoint
        let url = format!("{}/mods/files", self.api_url);
        debug!(file = id, url = %url, "fetching curseforge file");

        let response = self
            .post(&url)?
            .json(&serde_json::json!({ "fileIds": [file_id] }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RepoError::RateLimited);
        }

        let files: DataResponse<Vec<File>> = response.json().await?;
        files
            .data
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("curseforge file {}", id)))?
            .convert()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file_json() -> serde_json::Value {
        serde_json::json!({
            "id": 4465544,
            "modId": 238222,
            "displayName": "Jade 1.19.2-8.7.3",
            "fileName": "Jade-1.19.2-8.7.3.jar",
            "releaseType": 1,
            "fileDate": "2023-04-12T09:45:00Z",
            "downloadUrl": "https://edge.forgecdn.net/files/4465/544/Jade-1.19.2-8.7.3.jar",
            "gameVersions": ["1.19.2", "Forge", "22w13a", "Client"],
            "dependencies": [
                { "modId": 250398, "relationType": 3 },
                { "modId": 60089, "relationType": 2 }
            ]
        })
    }

    fn parse_file(value: serde_json::Value) -> File {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_convert_file_to_version() {
        let common = parse_file(sample_file_json()).convert().unwrap();

        assert_eq!(common.id, "4465544");
        assert_eq!(common.project_id.repository, Repository::Curseforge);
        assert_eq!(common.project_id.id, "238222");
        assert_eq!(common.release_type, ReleaseType::Release);
        assert_eq!(common.date_published.to_rfc3339(), "2023-04-12T09:45:00+00:00");
    }

    #[test]
    fn test_loaders_and_game_versions_are_split() {
        let common = parse_file(sample_file_json()).convert().unwrap();

        assert_eq!(common.loaders, vec!["forge"]);
        // the snapshot and the "Client" marker both drop out
        assert_eq!(
            common.game_versions,
            vec![MinecraftVersion::parse("1.19.2").unwrap()]
        );
    }

    #[test]
    fn test_single_file_is_primary() {
        let common = parse_file(sample_file_json()).convert().unwrap();

        assert_eq!(common.files.len(), 1);
        assert!(common.files[0].primary);
        assert_eq!(common.primary_file().unwrap().name, "Jade-1.19.2-8.7.3.jar");
    }

    #[test]
    fn test_release_type_mapping() {
        for (raw, expected) in [
            (1, ReleaseType::Release),
            (2, ReleaseType::Beta),
            (3, ReleaseType::Alpha),
        ] {
            let mut value = sample_file_json();
            value["releaseType"] = serde_json::json!(raw);
            assert_eq!(parse_file(value).convert().unwrap().release_type, expected);
        }
    }

    #[test]
    fn test_unknown_release_type_is_schema_error() {
        let mut value = sample_file_json();
        value["releaseType"] = serde_json::json!(7);

        assert!(matches!(
            parse_file(value).convert(),
            Err(RepoError::Schema(_))
        ));
    }

    #[test]
    fn test_missing_download_url_uses_cdn_layout() {
        let mut value = sample_file_json();
        value["downloadUrl"] = serde_json::Value::Null;

        let common = parse_file(value).convert().unwrap();
        assert_eq!(
            common.files[0].url,
            "https://edge.forgecdn.net/files/4465/544/Jade-1.19.2-8.7.3.jar"
        );
    }

    #[test]
    fn test_dependency_required_flag() {
        let common = parse_file(sample_file_json()).convert().unwrap();

        assert_eq!(common.dependencies.len(), 2);
        assert!(common.dependencies[0].required);
        assert!(!common.dependencies[1].required);
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_network() {
        let api = CurseforgeApi::with_api_url("http://127.0.0.1:9".to_string(), None);
        let result = api.search("jade", 10).await;
        assert!(matches!(result, Err(RepoError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_search_sends_api_key() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/mods/search")
            .match_query(mockito::Matcher::Any)
            .match_header("x-api-key", "$2a$10$test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "data": [{
                        "id": 238222,
                        "slug": "jade",
                        "name": "Jade",
                        "summary": "Shows what you are looking at",
                        "authors": [{ "name": "Snownee" }],
                        "latestFilesIndexes": [{ "gameVersion": "1.19.2" }]
                    }]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let api = CurseforgeApi::with_api_url(
            server.url(),
            Some(SecretString::from("$2a$10$test".to_string())),
        );
        let hits = api.search("jade", 10).await.unwrap();

        mock.assert_async().await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].slug.to_string(), "curseforge/jade");
        assert_eq!(hits[0].author.as_deref(), Some("Snownee"));
        assert_eq!(
            hits[0].latest_version,
            Some(MinecraftVersion::parse("1.19.2").unwrap())
        );
    }
}
