//! TreeNode / Forest - Per-directory snapshots of one side

use super::{DirEntry, FileEntry, SyncError};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::{BTreeMap, HashMap};

/// Snapshot of one directory's immediate children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    /// Path relative to the sync root (empty for the root itself)
    pub relative_path: Utf8PathBuf,

    /// Number of path segments; 0 for the root
    pub depth: usize,

    /// Remote identifier of this directory itself (remote side only)
    pub folder_id: Option<String>,

    /// Files keyed by name
    pub files: BTreeMap<String, FileEntry>,

    /// Subdirectories keyed by name
    pub dirs: BTreeMap<String, DirEntry>,
}

impl TreeNode {
    /// Create an empty local-side node
    pub fn local(relative_path: impl Into<Utf8PathBuf>) -> Self {
        let relative_path = relative_path.into();
        Self {
            depth: depth_of(&relative_path),
            relative_path,
            folder_id: None,
            files: BTreeMap::new(),
            dirs: BTreeMap::new(),
        }
    }

    /// Create an empty remote-side node for the folder `folder_id`
    pub fn remote(relative_path: impl Into<Utf8PathBuf>, folder_id: impl Into<String>) -> Self {
        let mut node = Self::local(relative_path);
        node.folder_id = Some(folder_id.into());
        node
    }

    /// Add a file; returns false if the name was already present
    pub fn add_file(&mut self, entry: FileEntry) -> bool {
        if self.files.contains_key(&entry.name) {
            return false;
        }
        self.files.insert(entry.name.clone(), entry);
        true
    }

    /// Add a subdirectory; returns false if the name was already present
    pub fn add_dir(&mut self, entry: DirEntry) -> bool {
        if self.dirs.contains_key(&entry.name) {
            return false;
        }
        self.dirs.insert(entry.name.clone(), entry);
        true
    }

    /// Relative path of a direct child of this node
    pub fn child_path(&self, name: &str) -> Utf8PathBuf {
        self.relative_path.join(name)
    }
}

/// All directory snapshots of one side, keyed by relative path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forest {
    nodes: HashMap<Utf8PathBuf, TreeNode>,
}

impl Forest {
    /// Create an empty forest
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, replacing any node already at the same path
    pub fn insert(&mut self, node: TreeNode) -> Option<TreeNode> {
        self.nodes.insert(node.relative_path.clone(), node)
    }

    /// Get a node by relative path
    pub fn get(&self, path: &Utf8Path) -> Option<&TreeNode> {
        self.nodes.get(path)
    }

    /// Get a mutable node by relative path
    pub fn get_mut(&mut self, path: &Utf8Path) -> Option<&mut TreeNode> {
        self.nodes.get_mut(path)
    }

    /// Remove (consume) a node by relative path
    pub fn remove(&mut self, path: &Utf8Path) -> Option<TreeNode> {
        self.nodes.remove(path)
    }

    /// Check if a node exists at the path
    pub fn contains(&self, path: &Utf8Path) -> bool {
        self.nodes.contains_key(path)
    }

    /// Remove every node at or below `prefix`, returning how many were removed
    pub fn remove_subtree(&mut self, prefix: &Utf8Path) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|path, _| !path.starts_with(prefix));
        before - self.nodes.len()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the forest has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterator over all nodes in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.values()
    }

    /// Paths grouped by depth, shallowest first, each tier sorted
    pub fn tiers(&self) -> BTreeMap<usize, Vec<Utf8PathBuf>> {
        let mut tiers: BTreeMap<usize, Vec<Utf8PathBuf>> = BTreeMap::new();
        for node in self.nodes.values() {
            tiers
                .entry(node.depth)
                .or_default()
                .push(node.relative_path.clone());
        }
        for paths in tiers.values_mut() {
            paths.sort();
        }
        tiers
    }

    /// Total number of file entries across all nodes
    pub fn file_count(&self) -> usize {
        self.nodes.values().map(|node| node.files.len()).sum()
    }
}

/// Number of path segments in a relative path
pub fn depth_of(path: &Utf8Path) -> usize {
    path.components()
        .filter(|c| matches!(c, camino::Utf8Component::Normal(_)))
        .count()
}

/// Normalise a user-supplied relative path (either separator, stray slashes)
pub fn normalize_rel_path(raw: &str) -> Utf8PathBuf {
    raw.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}

/// Normalise a path that must stay inside the sync root
///
/// Rooted input (`/x`, `\x`, `C:\x`) and `..` segments are rejected.
pub fn checked_rel_path(raw: &str) -> Result<Utf8PathBuf, SyncError> {
    let rooted = raw.starts_with(['/', '\\'])
        || raw
            .split(['/', '\\'])
            .next()
            .is_some_and(|first| first.ends_with(':'));
    if rooted {
        return Err(SyncError::Validation(format!(
            "Path '{}' must be relative to the sync root",
            raw
        )));
    }
    if raw.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(SyncError::Validation(format!(
            "Path '{}' escapes the sync root",
            raw
        )));
    }
    Ok(normalize_rel_path(raw))
}
