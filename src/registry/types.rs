//! Identifiers used by the registry: digests, repository names, tags and
//! manifest references.

use std::fmt;
use std::str::FromStr;

use super::error::{RegistryError, Result};
use crate::util::DigestAlgorithm;

// =============================================================================
// Digest
// =============================================================================

/// A content digest in `<algorithm>:<hex>` form, e.g. `sha256:2cf24d...`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
    alg: String,
    hex: String,
}

impl Digest {
    /// Build a digest from its parts without validating them.
    pub fn new(alg: impl Into<String>, hex: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            hex: hex.into(),
        }
    }

    /// A sha256 digest of the given bytes.
    pub fn sha256_of(data: &[u8]) -> Self {
        Self::new(
            DigestAlgorithm::Sha256.name(),
            DigestAlgorithm::Sha256.hex(data),
        )
    }

    pub fn alg(&self) -> &str {
        &self.alg
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// The hash algorithm named by this digest.
    pub fn algorithm(&self) -> Result<DigestAlgorithm> {
        self.alg
            .parse()
            .map_err(|_| RegistryError::InvalidDigest(self.to_string()))
    }

    /// The `<algorithm>:<hex>` form.
    pub fn string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.alg, self.hex)
    }
}

impl FromStr for Digest {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || RegistryError::InvalidDigest(s.to_string());
        let (alg, hex) = s.split_once(':').ok_or_else(invalid)?;
        let alg_valid = !alg.is_empty()
            && alg
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "+._-".contains(c));
        let hex_valid = !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
        if !alg_valid || !hex_valid {
            return Err(invalid());
        }
        Ok(Self::new(alg, hex))
    }
}

// =============================================================================
// Repository Name
// =============================================================================

/// Longest repository name accepted.
const MAX_NAME_LEN: usize = 255;

/// A repository (image) name such as `library/alpine`.
///
/// Slash-separated components of lowercase letters, digits and the separators
/// `.`, `_` and `-`; each component starts and ends with a letter or digit.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepoName(String);

impl RepoName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let invalid = |reason: &str| RegistryError::InvalidName {
            name: name.clone(),
            reason: reason.to_string(),
        };
        if name.is_empty() {
            return Err(invalid("empty"));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(invalid("too long"));
        }
        for component in name.split('/') {
            let edges_valid = component
                .chars()
                .next()
                .zip(component.chars().last())
                .is_some_and(|(first, last)| is_name_char(first) && is_name_char(last));
            if !edges_valid {
                return Err(invalid("component must start and end with a letter or digit"));
            }
            if !component
                .chars()
                .all(|c| is_name_char(c) || "._-".contains(c))
            {
                return Err(invalid("unexpected character"));
            }
        }
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RepoName {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

// =============================================================================
// Tag
// =============================================================================

/// Longest tag accepted.
const MAX_TAG_LEN: usize = 128;

/// A manifest tag such as `latest`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(String);

impl Tag {
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let tag = tag.into();
        let mut chars = tag.chars();
        let first_valid = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        let rest_valid = chars.all(|c| c.is_ascii_alphanumeric() || "_.-".contains(c));
        if !first_valid || !rest_valid || tag.len() > MAX_TAG_LEN {
            return Err(RegistryError::InvalidTag(tag));
        }
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Tag {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

// =============================================================================
// Manifest Reference
// =============================================================================

/// How a manifest is looked up: by content digest or by tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ManifestReference {
    Digest(Digest),
    Tag(Tag),
}

impl fmt::Display for ManifestReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestReference::Digest(digest) => digest.fmt(f),
            ManifestReference::Tag(tag) => tag.fmt(f),
        }
    }
}

impl FromStr for ManifestReference {
    type Err = RegistryError;

    /// A valid digest is read as a digest reference, anything else must be a
    /// valid tag.
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(digest) = s.parse::<Digest>() {
            return Ok(ManifestReference::Digest(digest));
        }
        Ok(ManifestReference::Tag(s.parse()?))
    }
}

impl From<Digest> for ManifestReference {
    fn from(digest: Digest) -> Self {
        ManifestReference::Digest(digest)
    }
}

impl From<Tag> for ManifestReference {
    fn from(tag: Tag) -> Self {
        ManifestReference::Tag(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_parse() {
        let digest: Digest = "sha256:abc123".parse().unwrap();
        assert_eq!(digest.alg(), "sha256");
        assert_eq!(digest.hex(), "abc123");
        assert_eq!(digest.to_string(), "sha256:abc123");
        assert_eq!(digest.algorithm().unwrap(), DigestAlgorithm::Sha256);

        assert!("sha256".parse::<Digest>().is_err());
        assert!("sha256:".parse::<Digest>().is_err());
        assert!(":abc".parse::<Digest>().is_err());
        assert!("sha256:xyz".parse::<Digest>().is_err());
    }

    #[test]
    fn test_digest_of_bytes() {
        assert_eq!(
            Digest::sha256_of(b"hello").to_string(),
            "sha256:2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_unknown_algorithm() {
        assert!(Digest::new("md5", "abc").algorithm().is_err());
    }

    #[test]
    fn test_repo_name() {
        assert!(RepoName::new("alpine").is_ok());
        assert!(RepoName::new("library/alpine").is_ok());
        assert!(RepoName::new("my-org/my_image.v2").is_ok());

        assert!(RepoName::new("").is_err());
        assert!(RepoName::new("Alpine").is_err());
        assert!(RepoName::new("/alpine").is_err());
        assert!(RepoName::new("alpine/").is_err());
        assert!(RepoName::new("-alpine").is_err());
        assert!(RepoName::new("a".repeat(256)).is_err());
    }

    #[test]
    fn test_tag() {
        assert!(Tag::new("latest").is_ok());
        assert!(Tag::new("1.0.0-rc_1").is_ok());
        assert!(Tag::new("_x").is_ok());

        assert!(Tag::new("").is_err());
        assert!(Tag::new(".hidden").is_err());
        assert!(Tag::new("a/b").is_err());
        assert!(Tag::new("a".repeat(129)).is_err());
    }

    #[test]
    fn test_manifest_reference() {
        assert_eq!(
            "sha256:abc".parse::<ManifestReference>().unwrap(),
            ManifestReference::Digest(Digest::new("sha256", "abc"))
        );
        assert_eq!(
            "latest".parse::<ManifestReference>().unwrap(),
            ManifestReference::Tag(Tag::new("latest").unwrap())
        );
        assert!("not:valid:tag".parse::<ManifestReference>().is_err());
    }
}
