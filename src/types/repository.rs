use serde::{Deserialize, Serialize};

/// Mod repositories we aggregate.
///
/// Closed set: everything downstream dispatches with exhaustive matches on this
/// enum, so adding an upstream is a compile-time extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Repository {
    /// Modrinth, the community-run registry.
    Modrinth,
    /// CurseForge, the commercial marketplace.
    Curseforge,
}

impl Repository {
    /// All repositories, in merge/display order.
    pub const ALL: [Repository; 2] = [Repository::Modrinth, Repository::Curseforge];

    pub fn as_str(&self) -> &'static str {
        match self {
            Repository::Modrinth => "modrinth",
            Repository::Curseforge => "curseforge",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Repository::Modrinth => "Modrinth",
            Repository::Curseforge => "CurseForge",
        }
    }
}

impl std::fmt::Display for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Repository {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "modrinth" => Ok(Repository::Modrinth),
            "curseforge" | "curse" => Ok(Repository::Curseforge),
            _ => Err(format!("unknown repository: {}", s)),
        }
    }
}

/// Stable opaque identity assigned to a project by an upstream repository.
///
/// Survives slug renames; this is what gets persisted in installed records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectId {
    pub repository: Repository,
    pub id: String,
}

impl ProjectId {
    pub fn new(repository: Repository, id: impl Into<String>) -> Self {
        Self {
            repository,
            id: id.into(),
        }
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.repository, self.id)
    }
}

/// Human-readable, repository-scoped project identity.
///
/// The same mod may carry different slugs on different repositories, so the
/// slug is only meaningful together with its repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectSlug {
    pub repository: Repository,
    pub slug: String,
}

impl ProjectSlug {
    pub fn new(repository: Repository, slug: impl Into<String>) -> Self {
        Self {
            repository,
            slug: slug.into(),
        }
    }
}

impl std::fmt::Display for ProjectSlug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.repository, self.slug)
    }
}

impl std::str::FromStr for ProjectSlug {
    type Err = String;

    /// Parse the `repository/slug` form used on the command line,
    /// e.g. `modrinth/sodium`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (repository, slug) = s
            .split_once('/')
            .ok_or_else(|| format!("expected repository/slug, got: {}", s))?;
        if slug.is_empty() {
            return Err(format!("empty slug in: {}", s));
        }
        Ok(Self::new(repository.parse::<Repository>()?, slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_round_trip() {
        for repository in Repository::ALL {
            assert_eq!(repository.as_str().parse::<Repository>(), Ok(repository));
        }
    }

    #[test]
    fn test_repository_rejects_unknown() {
        assert!("steam".parse::<Repository>().is_err());
    }

    #[test]
    fn test_slug_parse() {
        let slug: ProjectSlug = "modrinth/sodium".parse().unwrap();
        assert_eq!(slug.repository, Repository::Modrinth);
        assert_eq!(slug.slug, "sodium");
        assert_eq!(slug.to_string(), "modrinth/sodium");
    }

    #[test]
    fn test_slug_parse_rejects_bare_name() {
        assert!("sodium".parse::<ProjectSlug>().is_err());
        assert!("modrinth/".parse::<ProjectSlug>().is_err());
    }
}
