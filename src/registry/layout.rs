//! Storage keys of the docker-distribution on-disk layout.
//!
//! ```text
//! blobs/<alg>/<hh>/<hex>/data
//! repositories/<name>/_manifests/revisions/<alg>/<hex>/link
//! repositories/<name>/_manifests/tags/<tag>/current/link
//! ```

use super::types::{Digest, ManifestReference, RepoName};
use crate::storage::Key;

const BLOBS: &str = "blobs";
const REPOSITORIES: &str = "repositories";
pub(crate) const MANIFESTS: &str = "_manifests";

/// Key of a blob's data.
pub(crate) fn blob(digest: &Digest) -> Key {
    let hex = digest.hex();
    let shard = hex.get(..2).unwrap_or(hex);
    Key::from_parts([BLOBS, digest.alg(), shard, hex, "data"])
}

/// Root of every repository.
pub(crate) fn repositories() -> Key {
    Key::new(REPOSITORIES)
}

/// Key of the link file for a manifest reference.
pub(crate) fn manifest(name: &RepoName, reference: &ManifestReference) -> Key {
    let root = manifests(name);
    match reference {
        ManifestReference::Digest(digest) => root
            .join("revisions")
            .join(digest.alg())
            .join(digest.hex())
            .join("link"),
        ManifestReference::Tag(tag) => root
            .join("tags")
            .join(tag.as_str())
            .join("current")
            .join("link"),
    }
}

/// Directory holding one entry per tag.
pub(crate) fn tags(name: &RepoName) -> Key {
    manifests(name).join("tags")
}

fn manifests(name: &RepoName) -> Key {
    repositories().join(name.as_str()).join(MANIFESTS)
}

/// Temporary key for an upload that has not been verified yet.
pub(crate) fn upload(id: &str) -> Key {
    Key::from_parts(["_uploads", id, "data"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Tag;

    #[test]
    fn test_blob_key() {
        assert_eq!(
            blob(&Digest::new("sha256", "abcdef")).string(),
            "blobs/sha256/ab/abcdef/data"
        );
        assert_eq!(
            blob(&Digest::new("sha256", "a")).string(),
            "blobs/sha256/a/a/data"
        );
    }

    #[test]
    fn test_manifest_keys() {
        let name = RepoName::new("library/alpine").unwrap();
        assert_eq!(
            manifest(&name, &Digest::new("sha256", "abc").into()).string(),
            "repositories/library/alpine/_manifests/revisions/sha256/abc/link"
        );
        assert_eq!(
            manifest(&name, &Tag::new("latest").unwrap().into()).string(),
            "repositories/library/alpine/_manifests/tags/latest/current/link"
        );
        assert_eq!(
            tags(&name).string(),
            "repositories/library/alpine/_manifests/tags"
        );
    }
}
