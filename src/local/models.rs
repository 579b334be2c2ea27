//! Row types for the local database.

use sqlx::FromRow;

/// An installed mod as recorded on disk.
///
/// Deliberately minimal: repository, opaque project id and version id are the
/// identity; human-readable strings are resolved from the cache on demand.
#[derive(Debug, Clone, FromRow)]
pub struct InstalledProjectRow {
    pub id: String,
    pub repository: String,
    pub project_id: String,
    pub version_id: String,
    /// File name of the installed artifact inside the mods directory.
    pub file_name: Option<String>,
    pub installed_at: String,
}

/// Input for recording an installation.
#[derive(Debug, Clone)]
pub struct CreateInstalled {
    pub repository: String,
    pub project_id: String,
    pub version_id: String,
    pub file_name: Option<String>,
}
