//! Common data model produced by the repository adapters.
//!
//! Adapters convert upstream wire shapes into these types; everything above
//! the adapters (facade, resolver, commands) only ever sees this model. The
//! types are immutable once constructed and serializable so the request
//! context can cache them as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MinecraftVersion, ProjectId, ProjectSlug, ReleaseType};

/// Normalized project as returned by search and project-detail lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonProjectResult {
    pub id: ProjectId,
    pub slug: ProjectSlug,
    pub name: String,
    /// Display author. `None` when the upstream detail endpoint does not
    /// carry one (Modrinth's project endpoint only exposes a team id).
    pub author: Option<String>,
    pub description: String,
    /// Most recent supported game version, when the upstream reports it.
    pub latest_version: Option<MinecraftVersion>,
}

/// Normalized project version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonProjectVersion {
    /// Opaque version id assigned by the upstream.
    pub id: String,
    pub project_id: ProjectId,
    /// Display name of the version.
    pub name: String,
    /// Version number string, e.g. `0.4.10+1.19.2`.
    pub number: String,
    pub release_type: ReleaseType,
    pub date_published: DateTime<Utc>,
    /// Supported game versions. Unrecognized upstream strings are already
    /// dropped by the adapter.
    pub game_versions: Vec<MinecraftVersion>,
    /// Supported loaders, lowercased (`fabric`, `forge`, ...).
    pub loaders: Vec<String>,
    pub files: Vec<CommonVersionFile>,
    pub dependencies: Vec<CommonVersionDependency>,
}

impl CommonProjectVersion {
    /// The canonical download artifact for this version.
    ///
    /// Adapters mark at most one file as primary. When none is marked, the
    /// sole (or first) file stands in; consumers never re-derive primariness
    /// themselves.
    pub fn primary_file(&self) -> Option<&CommonVersionFile> {
        self.files
            .iter()
            .find(|file| file.primary)
            .or_else(|| self.files.first())
    }
}

/// A downloadable file belonging to a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonVersionFile {
    pub name: String,
    pub url: String,
    pub primary: bool,
    /// Hex sha512 of the file contents, when the upstream publishes one.
    pub sha512: Option<String>,
}

/// A dependency declared by a version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonVersionDependency {
    /// Opaque project id of the dependency, same repository as the owner.
    pub project_id: Option<String>,
    /// Specific version id, when the upstream pins one.
    pub version_id: Option<String>,
    pub required: bool,
}
