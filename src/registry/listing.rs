//! Paged name listings: repository catalogs and tag lists.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::error::Result;

/// One page of tags of a repository, `{"name": .., "tags": [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One page of repository names, `{"repositories": [..]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub repositories: Vec<String>,
}

impl Tags {
    pub fn new(name: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            name: name.into(),
            tags,
        }
    }

    pub fn from_json(json: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl Catalog {
    pub fn new(repositories: Vec<String>) -> Self {
        Self { repositories }
    }

    pub fn from_json(json: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// A page over a set of names: sorted, deduplicated, strictly after `from`,
/// at most `limit` entries.
pub(crate) fn page<I>(names: I, from: Option<&str>, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    names
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .filter(|name| from.map_or(true, |from| name.as_str() > from))
        .take(limit)
        .collect()
}

/// Merge an origin page with a cache page requested with the same marker and
/// limit.
///
/// Origin names come first in origin order, then cache names not already
/// contributed, in cache order. The marker itself is dropped from both sides
/// and the union is cut to `limit`, so overlapping sources can yield fewer
/// than `limit` names.
pub fn join_page(
    origin: Vec<String>,
    cache: Vec<String>,
    from: Option<&str>,
    limit: usize,
) -> Vec<String> {
    let mut joined: Vec<String> = Vec::new();
    for name in origin.into_iter().chain(cache) {
        if from == Some(name.as_str()) || joined.contains(&name) {
            continue;
        }
        joined.push(name);
    }
    joined.truncate(limit);
    joined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_join_page_keeps_origin_order_then_cache() {
        assert_eq!(
            join_page(
                names(&["one", "three", "four"]),
                names(&["one", "two"]),
                Some("four"),
                3
            ),
            names(&["one", "three", "two"])
        );
    }

    #[test]
    fn test_join_page_may_return_fewer_than_limit() {
        assert_eq!(
            join_page(names(&["a", "b"]), names(&["b", "a"]), None, 10),
            names(&["a", "b"])
        );
        assert!(join_page(Vec::new(), Vec::new(), None, 5).is_empty());
        assert!(join_page(names(&["a"]), names(&["b"]), None, 0).is_empty());
    }

    #[test]
    fn test_page() {
        let all = names(&["c", "a", "b", "a", "d"]);
        assert_eq!(page(all.clone(), None, 10), names(&["a", "b", "c", "d"]));
        assert_eq!(page(all.clone(), Some("b"), 10), names(&["c", "d"]));
        assert_eq!(page(all, Some("a"), 2), names(&["b", "c"]));
    }

    #[test]
    fn test_json_shapes() {
        let tags = Tags::from_json(br#"{"tags":["one","two"]}"#).unwrap();
        assert_eq!(tags.name, "");
        assert_eq!(tags.tags, names(&["one", "two"]));
        assert_eq!(
            Tags::new("alpine", names(&["latest"])).to_json().unwrap(),
            r#"{"name":"alpine","tags":["latest"]}"#
        );
        assert_eq!(
            Catalog::new(names(&["a", "b"])).to_json().unwrap(),
            r#"{"repositories":["a","b"]}"#
        );
    }
}
