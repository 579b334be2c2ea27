//! Repository API facade.
//!
//! The single call surface application code uses to talk to the upstream mod
//! repositories. Callers pick a [`CachePolicy`] per call and a [`Repository`]
//! where one applies; the facade dispatches to the matching adapter with an
//! exhaustive match and wraps every call in the cache-policy-aware request
//! context.
//!
//! # Example
//!
//! ```ignore
//! use crate::repo::{CachePolicy, CacheStore, RepoApi};
//!
//! let api = RepoApi::new(CacheStore::memory(), std::time::Duration::from_secs(3600), None);
//! let response = api.search("sodium", None, 10, CachePolicy::Normal).await?;
//! for hit in response.hits {
//!     println!("{}", hit.slug);
//! }
//! ```

mod cache;
mod client;
mod curseforge;
mod error;
mod model;
mod modrinth;

pub use cache::{CacheKey, CachePolicy, CacheStore, RequestContext};
pub use client::RepoClient;
pub use curseforge::CurseforgeApi;
pub use error::RepoError;
pub use model::{
    CommonProjectResult, CommonProjectVersion, CommonVersionDependency, CommonVersionFile,
};
pub use modrinth::ModrinthApi;

use std::time::Duration;

use secrecy::SecretString;
use tracing::debug;

use crate::types::{ProjectId, ProjectSlug, Repository};

/// Result of a (possibly multi-repository) search.
#[derive(Debug)]
pub struct SearchResponse {
    /// Merged hits, ordered by relevance rank, then repository.
    pub hits: Vec<CommonProjectResult>,
    /// Repositories whose search failed. Partial failures never fail the
    /// aggregate call.
    pub failures: Vec<SearchFailure>,
}

/// One repository's failure during a fan-out search.
#[derive(Debug)]
pub struct SearchFailure {
    pub repository: Repository,
    pub error: RepoError,
}

/// The unified entry point over all repository adapters.
pub struct RepoApi {
    modrinth: ModrinthApi,
    curseforge: CurseforgeApi,
    ctx: RequestContext,
}

impl RepoApi {
    pub fn new(store: CacheStore, ttl: Duration, curseforge_api_key: Option<SecretString>) -> Self {
        Self {
            modrinth: ModrinthApi::new(),
            curseforge: CurseforgeApi::new(curseforge_api_key),
            ctx: RequestContext::new(store, ttl),
        }
    }

    /// Assemble a facade from parts; used by tests to point the adapters at
    /// mock servers.
    pub fn with_clients(
        modrinth: ModrinthApi,
        curseforge: CurseforgeApi,
        ctx: RequestContext,
    ) -> Self {
        Self {
            modrinth,
            curseforge,
            ctx,
        }
    }

    /// Project details by opaque id.
    pub async fn basic_project_info(
        &self,
        id: &ProjectId,
        policy: CachePolicy,
    ) -> Result<Option<CommonProjectResult>, RepoError> {
        let key = CacheKey::new(id.repository, "project", &[&id.id]);
        match id.repository {
            Repository::Modrinth => {
                let api = self.modrinth.clone();
                let id = id.id.clone();
                self.ctx
                    .execute(policy, key, move || async move { api.project(&id).await })
                    .await
            }
            Repository::Curseforge => {
                let api = self.curseforge.clone();
                let id = id.id.clone();
                self.ctx
                    .execute(policy, key, move || async move { api.project(&id).await })
                    .await
            }
        }
    }

    /// Project details by slug.
    pub async fn project_by_slug(
        &self,
        slug: &ProjectSlug,
        policy: CachePolicy,
    ) -> Result<Option<CommonProjectResult>, RepoError> {
        let key = CacheKey::new(slug.repository, "project_slug", &[&slug.slug]);
        let project = match slug.repository {
            Repository::Modrinth => {
                let api = self.modrinth.clone();
                let slug = slug.slug.clone();
                self.ctx
                    .execute(policy, key, move || {
                        async move { api.project_by_slug(&slug).await }
                    })
                    .await?
            }
            Repository::Curseforge => {
                let api = self.curseforge.clone();
                let slug = slug.slug.clone();
                self.ctx
                    .execute(policy, key, move || {
                        async move { api.project_by_slug(&slug).await }
                    })
                    .await?
            }
        };

        // also file the result under its id key, so id-based cached-only
        // lookups (installed-list resolution) hit after a slug lookup
        if let Some(project) = &project {
            self.prime_project(project).await;
        }

        Ok(project)
    }

    /// All published versions of a project.
    pub async fn project_versions(
        &self,
        id: &ProjectId,
        policy: CachePolicy,
    ) -> Result<Option<Vec<CommonProjectVersion>>, RepoError> {
        let key = CacheKey::new(id.repository, "project_versions", &[&id.id]);
        match id.repository {
            Repository::Modrinth => {
                let api = self.modrinth.clone();
                let id = id.id.clone();
                self.ctx
                    .execute(policy, key, move || {
                        async move { api.project_versions(&id).await }
                    })
                    .await
            }
            Repository::Curseforge => {
                let api = self.curseforge.clone();
                let id = id.id.clone();
                self.ctx
                    .execute(policy, key, move || {
                        async move { api.project_versions(&id).await }
                    })
                    .await
            }
        }
    }

    /// A single version by opaque version id.
    pub async fn project_version(
        &self,
        version_id: &str,
        repository: Repository,
        policy: CachePolicy,
    ) -> Result<Option<CommonProjectVersion>, RepoError> {
        let key = CacheKey::new(repository, "version", &[version_id]);
        match repository {
            Repository::Modrinth => {
                let api = self.modrinth.clone();
                let id = version_id.to_string();
                self.ctx
                    .execute(policy, key, move || async move { api.version(&id).await })
                    .await
            }
            Repository::Curseforge => {
                let api = self.curseforge.clone();
                let id = version_id.to_string();
                self.ctx
                    .execute(policy, key, move || async move { api.version(&id).await })
                    .await
            }
        }
    }

    /// Search one repository, or fan out to all of them.
    ///
    /// With `repository: None`, both adapters are queried concurrently and a
    /// single adapter's failure degrades the call to partial results plus a
    /// recorded [`SearchFailure`] instead of failing it.
    pub async fn search(
        &self,
        query: &str,
        repository: Option<Repository>,
        limit: u32,
        policy: CachePolicy,
    ) -> Result<SearchResponse, RepoError> {
        if let Some(repository) = repository {
            let hits = self.search_one(repository, query, limit, policy).await?;
            return Ok(SearchResponse {
                hits,
                failures: Vec::new(),
            });
        }

        let (modrinth, curseforge) = tokio::join!(
            self.search_one(Repository::Modrinth, query, limit, policy),
            self.search_one(Repository::Curseforge, query, limit, policy),
        );

        let mut per_repository = Vec::new();
        let mut failures = Vec::new();
        for (repository, result) in [
            (Repository::Modrinth, modrinth),
            (Repository::Curseforge, curseforge),
        ] {
            match result {
                Ok(hits) => per_repository.push(hits),
                Err(error) => {
                    debug!(repository = repository.as_str(), error = %error, "search degraded");
                    failures.push(SearchFailure { repository, error });
                }
            }
        }

        Ok(SearchResponse {
            hits: merge_by_relevance(per_repository),
            failures,
        })
    }

    async fn search_one(
        &self,
        repository: Repository,
        query: &str,
        limit: u32,
        policy: CachePolicy,
    ) -> Result<Vec<CommonProjectResult>, RepoError> {
        let limit_arg = limit.to_string();
        let key = CacheKey::new(repository, "search", &[query, &limit_arg]);
        let hits = match repository {
            Repository::Modrinth => {
                let api = self.modrinth.clone();
                let query = query.to_string();
                self.ctx
                    .execute(policy, key, move || {
                        async move { api.search(&query, limit).await }
                    })
                    .await?
            }
            Repository::Curseforge => {
                let api = self.curseforge.clone();
                let query = query.to_string();
                self.ctx
                    .execute(policy, key, move || {
                        async move { api.search(&query, limit).await }
                    })
                    .await?
            }
        };
        Ok(hits.unwrap_or_default())
    }

    /// Fetch an artifact. Not cached; artifacts are written straight to disk.
    pub async fn download(&self, url: &str) -> Result<Vec<u8>, RepoError> {
        debug!(url, "downloading artifact");
        let response = self.modrinth.http().get(url).send().await?;
        if !response.status().is_success() {
            return Err(RepoError::Transport(format!(
                "download of {} failed with status {}",
                url,
                response.status()
            )));
        }
        Ok(response.bytes().await?.to_vec())
    }

    /// File a project under its id and slug keys without fetching.
    pub async fn prime_project(&self, project: &CommonProjectResult) {
        let by_id = CacheKey::new(project.id.repository, "project", &[&project.id.id]);
        let by_slug = CacheKey::new(project.slug.repository, "project_slug", &[&project.slug.slug]);
        for key in [by_id, by_slug] {
            if let Err(err) = self.ctx.prime(key, project).await {
                tracing::warn!(error = %err, "failed to prime project cache entry");
            }
        }
    }

    /// File a version under its id key without fetching.
    pub async fn prime_version(&self, version: &CommonProjectVersion) {
        let key = CacheKey::new(version.project_id.repository, "version", &[&version.id]);
        if let Err(err) = self.ctx.prime(key, version).await {
            tracing::warn!(error = %err, "failed to prime version cache entry");
        }
    }

    /// Drop every cached response. Returns the number of removed entries.
    pub async fn clear_cache(&self) -> Result<u64, RepoError> {
        self.ctx.clear().await
    }
}

/// Merge per-repository hit lists: rank 0 of every repository first, then
/// rank 1, and so on, repositories in [`Repository::ALL`] order within a rank.
fn merge_by_relevance(per_repository: Vec<Vec<CommonProjectResult>>) -> Vec<CommonProjectResult> {
    let longest = per_repository.iter().map(Vec::len).max().unwrap_or(0);
    let mut lists: Vec<_> = per_repository.into_iter().map(Vec::into_iter).collect();
    let mut merged = Vec::new();
    for _ in 0..longest {
        for list in &mut lists {
            if let Some(hit) = list.next() {
                merged.push(hit);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MinecraftVersion;

    fn test_api(modrinth_url: String, curseforge_url: String) -> RepoApi {
        RepoApi::with_clients(
            ModrinthApi::with_api_url(modrinth_url),
            CurseforgeApi::with_api_url(
                curseforge_url,
                Some(SecretString::from("$2a$10$test".to_string())),
            ),
            RequestContext::new(CacheStore::memory(), Duration::from_secs(3600)),
        )
    }

    fn modrinth_search_body(slugs: &[&str]) -> String {
        let hits: Vec<_> = slugs
            .iter()
            .map(|slug| {
                serde_json::json!({
                    "project_id": format!("id-{}", slug),
                    "slug": slug,
                    "title": slug,
                    "description": "a mod",
                    "author": "someone",
                    "versions": ["1.20.1"]
                })
            })
            .collect();
        serde_json::json!({ "hits": hits }).to_string()
    }

    fn curseforge_search_body(slugs: &[&str]) -> String {
        let mods: Vec<_> = slugs
            .iter()
            .enumerate()
            .map(|(i, slug)| {
                serde_json::json!({
                    "id": 1000 + i,
                    "slug": slug,
                    "name": slug,
                    "summary": "a mod",
                    "authors": [{ "name": "someone" }],
                    "latestFilesIndexes": [{ "gameVersion": "1.20.1" }]
                })
            })
            .collect();
        serde_json::json!({ "data": mods }).to_string()
    }

    #[tokio::test]
    async fn test_fan_out_merges_by_relevance_then_repository() {
        let mut modrinth = mockito::Server::new_async().await;
        let mut curseforge = mockito::Server::new_async().await;
        modrinth
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_body(modrinth_search_body(&["m-one", "m-two"]))
            .create_async()
            .await;
        curseforge
            .mock("GET", "/mods/search")
            .match_query(mockito::Matcher::Any)
            .with_body(curseforge_search_body(&["c-one"]))
            .create_async()
            .await;

        let api = test_api(modrinth.url(), curseforge.url());
        let response = api
            .search("mod", None, 10, CachePolicy::Normal)
            .await
            .unwrap();

        assert!(response.failures.is_empty());
        let slugs: Vec<_> = response
            .hits
            .iter()
            .map(|hit| hit.slug.to_string())
            .collect();
        assert_eq!(
            slugs,
            vec!["modrinth/m-one", "curseforge/c-one", "modrinth/m-two"]
        );
    }

    #[tokio::test]
    async fn test_fan_out_tolerates_one_failing_adapter() {
        let mut modrinth = mockito::Server::new_async().await;
        let mut curseforge = mockito::Server::new_async().await;
        modrinth
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_body(modrinth_search_body(&["m-one"]))
            .create_async()
            .await;
        curseforge
            .mock("GET", "/mods/search")
            .match_query(mockito::Matcher::Any)
            .with_status(500)
            .with_body("upstream exploded")
            .create_async()
            .await;

        let api = test_api(modrinth.url(), curseforge.url());
        let response = api
            .search("mod", None, 10, CachePolicy::Normal)
            .await
            .unwrap();

        assert_eq!(response.hits.len(), 1);
        assert_eq!(response.hits[0].slug.to_string(), "modrinth/m-one");
        assert_eq!(response.failures.len(), 1);
        assert_eq!(response.failures[0].repository, Repository::Curseforge);
    }

    #[tokio::test]
    async fn test_missing_api_key_is_a_partial_failure() {
        let mut modrinth = mockito::Server::new_async().await;
        modrinth
            .mock("GET", "/search")
            .match_query(mockito::Matcher::Any)
            .with_body(modrinth_search_body(&["m-one"]))
            .create_async()
            .await;

        let api = RepoApi::with_clients(
            ModrinthApi::with_api_url(modrinth.url()),
            CurseforgeApi::with_api_url("http://127.0.0.1:9".to_string(), None),
            RequestContext::new(CacheStore::memory(), Duration::from_secs(3600)),
        );
        let response = api
            .search("mod", None, 10, CachePolicy::Normal)
            .await
            .unwrap();

        assert_eq!(response.hits.len(), 1);
        assert_eq!(response.failures.len(), 1);
        assert_eq!(response.failures[0].error, RepoError::MissingApiKey);
    }

    #[tokio::test]
    async fn test_only_cached_issues_no_network_calls() {
        let mut modrinth = mockito::Server::new_async().await;
        let project_mock = modrinth
            .mock("GET", "/project/AANobbMI")
            .expect(0)
            .create_async()
            .await;

        let api = test_api(modrinth.url(), "http://127.0.0.1:9".to_string());
        let id = ProjectId::new(Repository::Modrinth, "AANobbMI");
        let result = api
            .basic_project_info(&id, CachePolicy::OnlyCached)
            .await
            .unwrap();

        assert!(result.is_none());
        project_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_normal_request_is_cached_across_calls() {
        let mut modrinth = mockito::Server::new_async().await;
        let project_mock = modrinth
            .mock("GET", "/project/AANobbMI")
            .with_body(
                serde_json::json!({
                    "id": "AANobbMI",
                    "slug": "sodium",
                    "title": "Sodium",
                    "description": "A modern rendering engine",
                    "game_versions": ["1.19.2", "1.20.1"]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let api = test_api(modrinth.url(), "http://127.0.0.1:9".to_string());
        let id = ProjectId::new(Repository::Modrinth, "AANobbMI");

        let first = api
            .basic_project_info(&id, CachePolicy::Normal)
            .await
            .unwrap()
            .unwrap();
        let second = api
            .basic_project_info(&id, CachePolicy::Normal)
            .await
            .unwrap()
            .unwrap();

        project_mock.assert_async().await;
        assert_eq!(first, second);
        assert_eq!(first.slug.to_string(), "modrinth/sodium");
        assert_eq!(
            first.latest_version,
            Some(MinecraftVersion::parse("1.20.1").unwrap())
        );
    }

    #[tokio::test]
    async fn test_slug_lookup_primes_id_keyed_entry() {
        let mut modrinth = mockito::Server::new_async().await;
        modrinth
            .mock("GET", "/project/sodium")
            .with_body(
                serde_json::json!({
                    "id": "AANobbMI",
                    "slug": "sodium",
                    "title": "Sodium",
                    "description": "A modern rendering engine",
                    "game_versions": ["1.19.2"]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let api = test_api(modrinth.url(), "http://127.0.0.1:9".to_string());
        let slug = ProjectSlug::new(Repository::Modrinth, "sodium");
        api.project_by_slug(&slug, CachePolicy::Normal)
            .await
            .unwrap()
            .unwrap();

        // the id-keyed lookup now resolves without any network call
        let id = ProjectId::new(Repository::Modrinth, "AANobbMI");
        let cached = api
            .basic_project_info(&id, CachePolicy::OnlyCached)
            .await
            .unwrap();
        assert_eq!(cached.unwrap().slug.slug, "sodium");
    }

    #[test]
    fn test_merge_empty() {
        assert!(merge_by_relevance(vec![]).is_empty());
        assert!(merge_by_relevance(vec![vec![], vec![]]).is_empty());
    }
}
