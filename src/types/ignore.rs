//! IgnoreRule - Exclusions applied to both forests before reconciliation

use super::{normalize_rel_path, SyncError};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;
use std::str::FromStr;

/// What an ignore rule covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreScope {
    /// One file, named by the last path segment
    SingleFile,
    /// Every file directly inside the directory (subdirectories still sync)
    AllFilesInDirectory,
    /// The directory and everything below it
    WholeSubtree,
}

impl IgnoreScope {
    fn as_str(self) -> &'static str {
        match self {
            IgnoreScope::SingleFile => "singleFile",
            IgnoreScope::AllFilesInDirectory => "allFiles",
            IgnoreScope::WholeSubtree => "wholeSubtree",
        }
    }
}

impl FromStr for IgnoreScope {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "singleFile" | "single_file" => Ok(IgnoreScope::SingleFile),
            "allFiles" | "all_files" | "allFilesInDirectory" => {
                Ok(IgnoreScope::AllFilesInDirectory)
            }
            "wholeSubtree" | "whole_subtree" | "folder" => Ok(IgnoreScope::WholeSubtree),
            other => Err(SyncError::Config(format!(
                "Unknown ignore type '{}': expected singleFile, allFiles or wholeSubtree",
                other
            ))),
        }
    }
}

/// One configured exclusion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    path: Utf8PathBuf,
    scope: IgnoreScope,
}

impl IgnoreRule {
    /// Build a rule from a relative path, rejecting rules that would exclude everything
    pub fn new(raw_path: &str, scope: IgnoreScope) -> Result<Self, SyncError> {
        let path = normalize_rel_path(raw_path);
        if path.as_str().is_empty() {
            match scope {
                IgnoreScope::WholeSubtree => {
                    return Err(SyncError::Config(
                        "Ignoring the whole sync root leaves nothing to sync".to_string(),
                    ))
                }
                IgnoreScope::SingleFile => {
                    return Err(SyncError::Config(
                        "A singleFile ignore rule needs a file path".to_string(),
                    ))
                }
                IgnoreScope::AllFilesInDirectory => {}
            }
        }
        Ok(Self { path, scope })
    }

    /// Rule path relative to the sync root
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Rule scope
    pub fn scope(&self) -> IgnoreScope {
        self.scope
    }

    /// Directory whose node the rule edits (the parent for file/subtree rules)
    pub fn parent(&self) -> &Utf8Path {
        match self.scope {
            IgnoreScope::AllFilesInDirectory => &self.path,
            IgnoreScope::SingleFile | IgnoreScope::WholeSubtree => {
                self.path.parent().unwrap_or(Utf8Path::new(""))
            }
        }
    }

    /// Last path segment (file or directory name), if the rule names one
    pub fn object_name(&self) -> Option<&str> {
        match self.scope {
            IgnoreScope::AllFilesInDirectory => None,
            IgnoreScope::SingleFile | IgnoreScope::WholeSubtree => self.path.file_name(),
        }
    }
}

/// Parses `path=<rel>,type=<scope>`
impl FromStr for IgnoreRule {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let usage = || {
            SyncError::Config(format!(
                "Wrong ignore spec '{}', expected path=<path>,type=<singleFile|allFiles|wholeSubtree>",
                s
            ))
        };

        let mut path = None;
        let mut scope = None;
        for part in s.split(',') {
            let (key, value) = part.split_once('=').ok_or_else(usage)?;
            match key.trim() {
                "path" => path = Some(value.trim()),
                "type" => scope = Some(value.trim().parse::<IgnoreScope>()?),
                _ => return Err(usage()),
            }
        }

        match (path, scope) {
            (Some(path), Some(scope)) => IgnoreRule::new(path, scope),
            _ => Err(usage()),
        }
    }
}

impl fmt::Display for IgnoreRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path={},type={}", self.path, self.scope.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_file_rule() {
        let rule: IgnoreRule = "path=docs/notes.txt,type=singleFile".parse().unwrap();

        assert_eq!(rule.scope(), IgnoreScope::SingleFile);
        assert_eq!(rule.parent(), Utf8Path::new("docs"));
        assert_eq!(rule.object_name(), Some("notes.txt"));
    }

    #[test]
    fn test_parse_accepts_either_key_order_and_strips_slashes() {
        let rule: IgnoreRule = "type=wholeSubtree,path=/build/".parse().unwrap();

        assert_eq!(rule.path(), Utf8Path::new("build"));
        assert_eq!(rule.parent(), Utf8Path::new(""));
        assert_eq!(rule.object_name(), Some("build"));
    }

    #[test]
    fn test_all_files_rule_targets_the_directory_itself() {
        let rule: IgnoreRule = "path=cache,type=allFiles".parse().unwrap();

        assert_eq!(rule.parent(), Utf8Path::new("cache"));
        assert_eq!(rule.object_name(), None);
    }

    #[test]
    fn test_all_files_rule_may_target_root() {
        let rule = IgnoreRule::new("", IgnoreScope::AllFilesInDirectory).unwrap();
        assert_eq!(rule.parent(), Utf8Path::new(""));
    }

    #[test]
    fn test_whole_subtree_on_root_is_rejected() {
        let err = IgnoreRule::new("/", IgnoreScope::WholeSubtree).unwrap_err();
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_malformed_specs_are_usage_errors() {
        for spec in [
            "docs",
            "path=docs",
            "type=singleFile",
            "path=docs,type=everything",
            "path=docs,kind=allFiles",
        ] {
            let err = spec.parse::<IgnoreRule>().unwrap_err();
            assert!(err.is_usage_error(), "spec {:?} should be rejected", spec);
        }
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        let rule: IgnoreRule = "path=a/b,type=allFiles".parse().unwrap();
        let reparsed: IgnoreRule = rule.to_string().parse().unwrap();
        assert_eq!(rule, reparsed);
    }
}
