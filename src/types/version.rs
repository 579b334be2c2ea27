use serde::{Deserialize, Serialize};

/// A Minecraft game version such as `1.19` or `1.19.2`.
///
/// Upstreams report supported game versions as free-form strings that also
/// include snapshots and other non-release builds. [`MinecraftVersion::parse`]
/// returns `None` for those, and converters drop them from supported-version
/// lists instead of failing the whole record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct MinecraftVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: Option<u32>,
}

impl MinecraftVersion {
    pub fn new(major: u32, minor: u32, patch: Option<u32>) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a `major.minor` or `major.minor.patch` release version.
    ///
    /// Snapshots (`23w31a`), pre-releases (`1.20-pre1`) and anything else that
    /// is not purely numeric come back as `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = match parts.next() {
            Some(part) => Some(part.parse().ok()?),
            None => None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, patch))
    }
}

impl std::fmt::Display for MinecraftVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.patch {
            Some(patch) => write!(f, "{}.{}.{}", self.major, self.minor, patch),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

/// Release channel of a published version.
///
/// Ordered so that `Release` compares greatest, which lets version selection
/// prefer stable builds with a plain `max`/`sort`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Alpha,
    Beta,
    Release,
}

impl ReleaseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Alpha => "alpha",
            ReleaseType::Beta => "beta",
            ReleaseType::Release => "release",
        }
    }
}

impl std::fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_release_versions() {
        assert_eq!(
            MinecraftVersion::parse("1.19"),
            Some(MinecraftVersion::new(1, 19, None))
        );
        assert_eq!(
            MinecraftVersion::parse("1.19.2"),
            Some(MinecraftVersion::new(1, 19, Some(2)))
        );
    }

    #[test]
    fn test_parse_rejects_non_release_strings() {
        assert_eq!(MinecraftVersion::parse("23w31a"), None);
        assert_eq!(MinecraftVersion::parse("1.20-pre1"), None);
        assert_eq!(MinecraftVersion::parse("99.99-bogus"), None);
        assert_eq!(MinecraftVersion::parse("1.19.2.1"), None);
        assert_eq!(MinecraftVersion::parse(""), None);
    }

    #[test]
    fn test_version_ordering() {
        let old = MinecraftVersion::parse("1.18.2").unwrap();
        let new = MinecraftVersion::parse("1.19").unwrap();
        let patched = MinecraftVersion::parse("1.19.2").unwrap();
        assert!(old < new);
        assert!(new < patched);
    }

    #[test]
    fn test_release_type_ordering() {
        assert!(ReleaseType::Release > ReleaseType::Beta);
        assert!(ReleaseType::Beta > ReleaseType::Alpha);
    }

    #[test]
    fn test_display() {
        assert_eq!(MinecraftVersion::new(1, 19, Some(2)).to_string(), "1.19.2");
        assert_eq!(MinecraftVersion::new(1, 19, None).to_string(), "1.19");
        assert_eq!(ReleaseType::Release.to_string(), "release");
    }
}
