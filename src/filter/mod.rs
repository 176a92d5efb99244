//! Ignore Filter - Symmetric exclusions applied before reconciliation
//!
//! The same rules must be applied to both forests. Filtering only one side
//! would make the excluded object look like a one-sided create or delete.

use crate::types::{Forest, IgnoreRule, IgnoreScope};
use camino::Utf8Path;
use tracing::debug;

/// Root-level files that are never synced in either direction
pub const RESERVED_FILES: &[&str] = &["sync_data.txt"];

/// Apply every rule to one forest, returning the number of entries and nodes removed
pub fn apply_ignore_rules(forest: &mut Forest, rules: &[IgnoreRule]) -> usize {
    rules.iter().map(|rule| apply_rule(forest, rule)).sum()
}

/// Remove the reserved root-level files from one forest
pub fn exclude_reserved(forest: &mut Forest) -> usize {
    let Some(root) = forest.get_mut(Utf8Path::new("")) else {
        return 0;
    };
    RESERVED_FILES
        .iter()
        .filter(|name| root.files.remove(**name).is_some())
        .count()
}

/// Apply the reserved exclusions and the configured rules to both forests
pub fn filter_forests(local: &mut Forest, remote: &mut Forest, rules: &[IgnoreRule]) {
    for (side, forest) in [("local", local), ("remote", remote)] {
        let removed = exclude_reserved(forest) + apply_ignore_rules(forest, rules);
        if removed > 0 {
            debug!("Ignore rules removed {} {} entries", removed, side);
        }
    }
}

fn apply_rule(forest: &mut Forest, rule: &IgnoreRule) -> usize {
    match rule.scope() {
        IgnoreScope::SingleFile => {
            let Some(name) = rule.object_name() else {
                return 0;
            };
            forest
                .get_mut(rule.parent())
                .and_then(|node| node.files.remove(name))
                .map_or(0, |_| 1)
        }
        IgnoreScope::AllFilesInDirectory => match forest.get_mut(rule.path()) {
            Some(node) => {
                let count = node.files.len();
                node.files.clear();
                count
            }
            None => 0,
        },
        IgnoreScope::WholeSubtree => {
            let mut removed = forest.remove_subtree(rule.path());
            if let (Some(name), Some(parent)) = (rule.object_name(), forest.get_mut(rule.parent())) {
                if parent.dirs.remove(name).is_some() {
                    removed += 1;
                }
            }
            removed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DirEntry, FileEntry, TreeNode};

    fn sample_forest() -> Forest {
        let mut forest = Forest::new();
        let mut root = TreeNode::local("");
        root.add_file(FileEntry::local("sync_data.txt", 1));
        root.add_file(FileEntry::local("keep.txt", 1));
        root.add_dir(DirEntry::local("build"));
        root.add_dir(DirEntry::local("docs"));
        forest.insert(root);

        let mut build = TreeNode::local("build");
        build.add_file(FileEntry::local("out.o", 1));
        build.add_dir(DirEntry::local("deep"));
        forest.insert(build);
        forest.insert(TreeNode::local(Utf8Path::new("build").join("deep")));

        let mut docs = TreeNode::local("docs");
        docs.add_file(FileEntry::local("a.md", 1));
        docs.add_file(FileEntry::local("b.md", 1));
        docs.add_dir(DirEntry::local("img"));
        forest.insert(docs);
        forest.insert(TreeNode::local(Utf8Path::new("docs").join("img")));
        forest
    }

    fn rule(spec: &str) -> IgnoreRule {
        spec.parse().expect("valid ignore spec")
    }

    #[test]
    fn test_single_file_rule() {
        let mut forest = sample_forest();
        let removed = apply_ignore_rules(&mut forest, &[rule("path=docs/a.md,type=singleFile")]);

        assert_eq!(removed, 1);
        let docs = forest.get(Utf8Path::new("docs")).unwrap();
        assert!(!docs.files.contains_key("a.md"));
        assert!(docs.files.contains_key("b.md"));
    }

    #[test]
    fn test_all_files_rule_keeps_subdirectories() {
        let mut forest = sample_forest();
        apply_ignore_rules(&mut forest, &[rule("path=docs,type=allFiles")]);

        let docs = forest.get(Utf8Path::new("docs")).unwrap();
        assert!(docs.files.is_empty());
        assert!(docs.dirs.contains_key("img"));
        assert!(forest.contains(&Utf8Path::new("docs").join("img")));
    }

    #[test]
    fn test_whole_subtree_rule() {
        let mut forest = sample_forest();
        apply_ignore_rules(&mut forest, &[rule("path=build,type=wholeSubtree")]);

        assert!(!forest.contains(Utf8Path::new("build")));
        assert!(!forest.contains(&Utf8Path::new("build").join("deep")));
        assert!(!forest.get(Utf8Path::new("")).unwrap().dirs.contains_key("build"));
        assert!(forest.contains(Utf8Path::new("docs")));
    }

    #[test]
    fn test_rule_for_missing_path_is_noop() {
        let mut forest = sample_forest();
        let before = forest.clone();

        let removed = apply_ignore_rules(
            &mut forest,
            &[
                rule("path=nope/x.txt,type=singleFile"),
                rule("path=nope,type=wholeSubtree"),
            ],
        );

        assert_eq!(removed, 0);
        assert_eq!(forest, before);
    }

    #[test]
    fn test_reserved_file_excluded_at_root_only() {
        let mut forest = sample_forest();
        forest
            .get_mut(Utf8Path::new("docs"))
            .unwrap()
            .add_file(FileEntry::local("sync_data.txt", 1));

        assert_eq!(exclude_reserved(&mut forest), 1);
        assert!(!forest.get(Utf8Path::new("")).unwrap().files.contains_key("sync_data.txt"));
        assert!(forest.get(Utf8Path::new("docs")).unwrap().files.contains_key("sync_data.txt"));
    }

    #[test]
    fn test_filter_forests_is_symmetric() {
        let mut local = sample_forest();
        let mut remote = sample_forest();
        let rules = vec![rule("path=build,type=wholeSubtree"), rule("path=keep.txt,type=singleFile")];

        filter_forests(&mut local, &mut remote, &rules);

        assert_eq!(local, remote);
        let root = local.get(Utf8Path::new("")).unwrap();
        assert!(root.files.is_empty());
    }
}
