//! Adapter contract shared by the upstream repository clients.

use std::future::Future;

use super::error::RepoError;
use super::model::{CommonProjectResult, CommonProjectVersion};

/// Trait implemented by each upstream adapter.
///
/// An adapter performs the network call, deserializes the upstream wire
/// shape, and converts deterministically into the common model. Adapters hold
/// no caching logic; every call is wrapped by the request context one layer
/// up. Conversion failures (an upstream value outside the documented
/// contract) are terminal for the call and never retried.
pub trait RepoClient: Send + Sync {
    /// Full-text search, in upstream relevance order.
    fn search(
        &self,
        query: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<CommonProjectResult>, RepoError>> + Send;

    /// Project details by opaque id.
    fn project(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<CommonProjectResult, RepoError>> + Send;

    /// Project details by slug.
    fn project_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = Result<CommonProjectResult, RepoError>> + Send;

    /// All published versions of a project, newest first as reported upstream.
    fn project_versions(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Vec<CommonProjectVersion>, RepoError>> + Send;

    /// A single version by its opaque version id.
    fn version(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<CommonProjectVersion, RepoError>> + Send;
}
