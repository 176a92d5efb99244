//! ActionBatch - Externally decided changes for the partial-update mode

use super::SyncError;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Explicit actions to mirror onto the remote side, applied without diffing
///
/// Keys follow the camelCase wire names; snake_case spellings are accepted
/// too. Unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActionBatch {
    #[serde(rename = "createDir", alias = "create_dir")]
    pub create_dir: Vec<String>,

    #[serde(rename = "deleteDir", alias = "delete_dir")]
    pub delete_dir: Vec<String>,

    #[serde(rename = "deleteFile", alias = "delete_file")]
    pub delete_file: Vec<String>,

    #[serde(rename = "createFile", alias = "create_file")]
    pub create_file: Vec<String>,

    #[serde(rename = "updateFile", alias = "update_file")]
    pub update_file: Vec<String>,

    /// old path -> new path
    pub rename: BTreeMap<String, String>,

    /// old path -> new path
    #[serde(rename = "move")]
    pub moves: BTreeMap<String, String>,
}

impl ActionBatch {
    /// Parse a batch from its JSON form
    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        serde_json::from_str(json)
            .map_err(|e| SyncError::Config(format!("Invalid actions JSON: {}", e)))
    }

    /// Total number of requested actions
    pub fn len(&self) -> usize {
        self.create_dir.len()
            + self.delete_dir.len()
            + self.delete_file.len()
            + self.create_file.len()
            + self.update_file.len()
            + self.rename.len()
            + self.moves.len()
    }

    /// Check if the batch requests nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
