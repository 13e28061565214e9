//! Hierarchical storage keys.

use std::fmt;

/// Separator between key segments in the string form.
pub const DELIMITER: &str = "/";

/// A path-like identifier of a value in a [`Storage`](super::Storage).
///
/// A key is an ordered list of non-empty segments. The root key has no
/// segments. Equality, ordering and hashing are structural over the segments.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Key {
    parts: Vec<String>,
}

impl Key {
    /// The root key (no segments).
    pub const ROOT: Key = Key { parts: Vec::new() };

    /// Build a key from a `/`-separated string. Empty segments are dropped,
    /// so `""` and `"/"` both produce the root key.
    pub fn new(path: &str) -> Self {
        Self::from_parts(path.split(DELIMITER))
    }

    /// Build a key from individual segments. Segments containing `/` are split.
    pub fn from_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parts = parts
            .into_iter()
            .flat_map(|part| {
                part.as_ref()
                    .split(DELIMITER)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { parts }
    }

    /// Append one or more segments to this key.
    pub fn join(&self, path: &str) -> Self {
        let mut key = self.clone();
        key.parts.extend(Key::new(path).parts);
        key
    }

    /// Append all segments of another key to this key.
    pub fn concat(&self, other: &Key) -> Self {
        let mut key = self.clone();
        key.parts.extend(other.parts.iter().cloned());
        key
    }

    /// The segments of this key.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Whether this is the root key.
    pub fn is_root(&self) -> bool {
        self.parts.is_empty()
    }

    /// The parent key, or `None` for the root.
    pub fn parent(&self) -> Option<Key> {
        if self.parts.is_empty() {
            None
        } else {
            Some(Key {
                parts: self.parts[..self.parts.len() - 1].to_vec(),
            })
        }
    }

    /// The last segment, or `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.parts.last().map(String::as_str)
    }

    /// Whether `prefix` is a segment-wise prefix of this key.
    ///
    /// `a/bc` does not start with `a/b`.
    pub fn starts_with(&self, prefix: &Key) -> bool {
        self.parts.starts_with(&prefix.parts)
    }

    /// Remove a segment-wise prefix, returning `None` if it does not match.
    pub fn strip_prefix(&self, prefix: &Key) -> Option<Key> {
        if self.starts_with(prefix) {
            Some(Key {
                parts: self.parts[prefix.parts.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// The `/`-joined string form.
    pub fn string(&self) -> String {
        self.parts.join(DELIMITER)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.string())
    }
}

impl From<&str> for Key {
    fn from(path: &str) -> Self {
        Key::new(path)
    }
}

impl From<String> for Key {
    fn from(path: String) -> Self {
        Key::new(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_string() {
        let key = Key::new("a/b/c");
        assert_eq!(key.parts(), &["a", "b", "c"]);
        assert_eq!(key.string(), "a/b/c");
        assert_eq!(key.to_string(), "a/b/c");
    }

    #[test]
    fn test_root() {
        assert!(Key::new("").is_root());
        assert!(Key::new("/").is_root());
        assert_eq!(Key::ROOT.string(), "");
        assert_eq!(Key::ROOT.parent(), None);
    }

    #[test]
    fn test_empty_segments_dropped() {
        assert_eq!(Key::new("/a//b/"), Key::new("a/b"));
        assert_eq!(Key::from_parts(["a/b", "", "c"]), Key::new("a/b/c"));
    }

    #[test]
    fn test_join_and_parent() {
        let key = Key::new("a").join("b/c");
        assert_eq!(key, Key::new("a/b/c"));
        assert_eq!(key.parent(), Some(Key::new("a/b")));
        assert_eq!(key.name(), Some("c"));
        assert_eq!(Key::new("x").concat(&key), Key::new("x/a/b/c"));
    }

    #[test]
    fn test_prefix_is_segment_wise() {
        let key = Key::new("a/bc/d");
        assert!(key.starts_with(&Key::new("a/bc")));
        assert!(!key.starts_with(&Key::new("a/b")));
        assert!(key.starts_with(&Key::ROOT));
        assert_eq!(key.strip_prefix(&Key::new("a")), Some(Key::new("bc/d")));
        assert_eq!(key.strip_prefix(&Key::new("b")), None);
    }
}
