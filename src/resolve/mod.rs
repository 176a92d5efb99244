//! Path Resolver - Maps relative paths onto remote folder identifiers
//!
//! Object-storage services have no path lookup, only "children of X named
//! Y", so a path is resolved one segment at a time from a root folder.
//! An [`IdCache`] shared across calls lets sibling lookups in the same run
//! skip the segments already resolved.

use crate::store::{RemoteStore, SearchScope};
use crate::types::SyncError;
use std::collections::HashMap;
use tracing::{info, warn};

/// Whether missing segments are created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveMode {
    /// Create every missing segment in order
    Create,
    /// Never mutate; stop at the deepest existing ancestor
    NoCreate,
}

/// Outcome of a resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Final folder id (Create), or the deepest existing ancestor (NoCreate miss)
    pub id: String,
    /// True only if every segment already existed
    pub found: bool,
}

/// Resolved-so-far path -> folder id, valid for one run
#[derive(Debug, Clone, Default)]
pub struct IdCache {
    ids: HashMap<String, String>,
}

impl IdCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached id for a path
    pub fn get(&self, path: &str) -> Option<&str> {
        self.ids.get(&cache_key(path)).map(String::as_str)
    }

    /// Remember the id of a path
    pub fn insert(&mut self, path: &str, id: impl Into<String>) {
        self.ids.insert(cache_key(path), id.into());
    }

    /// Drop the entry for `prefix` and every entry below it, returning how many were dropped
    pub fn purge_under(&mut self, prefix: &str) -> usize {
        let prefix = cache_key(prefix);
        let nested = format!("{}/", prefix);
        let before = self.ids.len();
        self.ids
            .retain(|key, _| !(prefix.is_empty() || *key == prefix || key.starts_with(&nested)));
        before - self.ids.len()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Resolve `path` (segments separated by `/` or the platform separator) below `root_id`
///
/// When several folders share a segment's name the first one returned by the
/// store is used and a warning is logged.
pub fn resolve_path(
    remote: &mut dyn RemoteStore,
    root_id: &str,
    path: &str,
    mode: ResolveMode,
    mut cache: Option<&mut IdCache>,
) -> Result<Resolved, SyncError> {
    let segments = split_segments(path);
    let keys: Vec<String> = (1..=segments.len())
        .map(|n| segments[..n].join("/"))
        .collect();
    let mut parent = root_id.to_string();

    for (index, segment) in segments.iter().enumerate() {
        if let Some(id) = cache.as_deref().and_then(|c| c.get(&keys[index])) {
            parent = id.to_string();
            continue;
        }

        let matches = remote.search(segment, &parent, SearchScope::Folders)?;
        match matches.first() {
            Some(id) => {
                if matches.len() > 1 {
                    warn!(
                        "{} folders named '{}' under {}; using the first match",
                        matches.len(),
                        keys[index],
                        parent
                    );
                }
                parent = id.clone();
                if let Some(c) = cache.as_deref_mut() {
                    c.insert(&keys[index], parent.clone());
                }
            }
            None => {
                if mode == ResolveMode::NoCreate {
                    return Ok(Resolved {
                        id: parent,
                        found: false,
                    });
                }
                for (offset, missing) in segments[index..].iter().enumerate() {
                    info!("-> Creating remote folder {}", keys[index + offset]);
                    parent = remote.create_folder(missing, &parent)?;
                    if let Some(c) = cache.as_deref_mut() {
                        c.insert(&keys[index + offset], parent.clone());
                    }
                }
                return Ok(Resolved {
                    id: parent,
                    found: false,
                });
            }
        }
    }

    Ok(Resolved {
        id: parent,
        found: true,
    })
}

/// Split a relative path into its parent path and final name
pub fn split_parent(path: &str) -> Option<(String, String)> {
    let mut segments = split_segments(path);
    let name = segments.pop()?.to_string();
    Some((segments.join("/"), name))
}

fn split_segments(path: &str) -> Vec<&str> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}

fn cache_key(path: &str) -> String {
    split_segments(path).join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRemote;

    #[test]
    fn test_resolve_existing_path() {
        let mut remote = MemoryRemote::new();
        let target = remote.put_folder("a/b/c").unwrap();

        let resolved =
            resolve_path(&mut remote, "root", "a/b/c", ResolveMode::NoCreate, None).unwrap();

        assert_eq!(resolved, Resolved { id: target, found: true });
    }

    #[test]
    fn test_empty_path_is_root() {
        let mut remote = MemoryRemote::new();
        let resolved = resolve_path(&mut remote, "root", "/", ResolveMode::Create, None).unwrap();
        assert_eq!(resolved, Resolved { id: "root".to_string(), found: true });
    }

    #[test]
    fn test_create_mode_builds_missing_segments() {
        let mut remote = MemoryRemote::new();
        remote.put_folder("a").unwrap();

        let resolved = resolve_path(&mut remote, "root", "a/b/c", ResolveMode::Create, None).unwrap();

        assert!(!resolved.found);
        assert_eq!(remote.find_path("a/b/c"), Some(resolved.id));
        assert_eq!(remote.mutation_count(), 3, "a pre-seeded, b and c created");
    }

    #[test]
    fn test_no_create_returns_deepest_ancestor_without_mutation() {
        let mut remote = MemoryRemote::new();
        let a = remote.put_folder("a").unwrap();
        let before = remote.mutation_count();

        let resolved =
            resolve_path(&mut remote, "root", "a/missing/deeper", ResolveMode::NoCreate, None)
                .unwrap();

        assert_eq!(resolved, Resolved { id: a, found: false });
        assert_eq!(remote.mutation_count(), before);
    }

    #[test]
    fn test_backslash_separated_path() {
        let mut remote = MemoryRemote::new();
        let target = remote.put_folder("x/y").unwrap();

        let resolved = resolve_path(&mut remote, "root", "x\\y", ResolveMode::NoCreate, None).unwrap();
        assert_eq!(resolved.id, target);
    }

    #[test]
    fn test_duplicate_folders_pick_first() {
        let mut remote = MemoryRemote::new();
        let first = remote.create_folder("dup", "root").unwrap();
        remote.create_folder("dup", "root").unwrap();

        let resolved = resolve_path(&mut remote, "root", "dup", ResolveMode::NoCreate, None).unwrap();
        assert_eq!(resolved.id, first);
    }

    #[test]
    fn test_cache_short_circuits_lookups() {
        let mut remote = MemoryRemote::new();
        let b = remote.put_folder("a/b").unwrap();
        let mut cache = IdCache::new();

        resolve_path(&mut remote, "root", "a/b", ResolveMode::NoCreate, Some(&mut cache)).unwrap();
        assert_eq!(cache.get("a/b"), Some(b.as_str()));

        // A cache hit never consults the store, so the rename goes unnoticed
        let a = remote.find_path("a").unwrap();
        remote.rename(&a, "renamed").unwrap();
        let cached =
            resolve_path(&mut remote, "root", "a/b", ResolveMode::NoCreate, Some(&mut cache))
                .unwrap();
        assert_eq!(cached, Resolved { id: b, found: true });

        let uncached = resolve_path(&mut remote, "root", "a/b", ResolveMode::NoCreate, None).unwrap();
        assert!(!uncached.found);
    }

    #[test]
    fn test_create_mode_populates_cache() {
        let mut remote = MemoryRemote::new();
        let mut cache = IdCache::new();

        let resolved =
            resolve_path(&mut remote, "root", "n/m", ResolveMode::Create, Some(&mut cache)).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("n/m"), Some(resolved.id.as_str()));
    }

    #[test]
    fn test_purge_under_removes_subtree_only() {
        let mut cache = IdCache::new();
        cache.insert("old", "1");
        cache.insert("old/inner", "2");
        cache.insert("older", "3");

        assert_eq!(cache.purge_under("old"), 2);
        assert_eq!(cache.get("older"), Some("3"));
        assert!(cache.get("old").is_none());
    }

    #[test]
    fn test_split_parent() {
        assert_eq!(
            split_parent("a/b/c.txt"),
            Some(("a/b".to_string(), "c.txt".to_string()))
        );
        assert_eq!(split_parent("c.txt"), Some((String::new(), "c.txt".to_string())));
        assert_eq!(split_parent("/"), None);
    }
}
