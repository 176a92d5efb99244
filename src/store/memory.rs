//! In-memory object store, persisted as JSON between runs
//!
//! Behaves like a folder-based object-storage service: every object has an
//! opaque identifier, names are not unique within a folder, timestamps have
//! second granularity, and deleting a folder removes its contents.

use super::{RemoteItem, RemoteKind, RemotePage, RemoteStore, SearchScope};
use crate::types::SyncError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

const ROOT_ID: &str = "root";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RemoteObject {
    name: String,
    parent: Option<String>,
    kind: RemoteKind,
    modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    content: Vec<u8>,
}

/// Object store held in memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRemote {
    next_id: u64,
    objects: BTreeMap<String, RemoteObject>,
    #[serde(skip)]
    mutations: u64,
}

impl MemoryRemote {
    /// Create a store holding only the root folder
    pub fn new() -> Self {
        let mut objects = BTreeMap::new();
        objects.insert(
            ROOT_ID.to_string(),
            RemoteObject {
                name: String::new(),
                parent: None,
                kind: RemoteKind::Folder,
                modified: now_seconds(),
                content: Vec::new(),
            },
        );
        Self {
            next_id: 1,
            objects,
            mutations: 0,
        }
    }

    /// Load a store from a JSON file, starting empty if the file does not exist
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        if !path.exists() {
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        let store: MemoryRemote = serde_json::from_str(&content)?;
        if !store.objects.contains_key(ROOT_ID) {
            return Err(SyncError::Validation(format!(
                "Remote store {} has no root folder",
                path.display()
            )));
        }
        Ok(store)
    }

    /// Persist the store as JSON (write-then-rename)
    pub fn save(&self, path: &Path) -> Result<(), SyncError> {
        let json = serde_json::to_string_pretty(self)?;
        let part_path = path.with_extension("json.part");
        fs::write(&part_path, json)?;
        fs::rename(&part_path, path)?;
        Ok(())
    }

    /// Number of mutating calls served since this value was created or loaded
    pub fn mutation_count(&self) -> u64 {
        self.mutations
    }

    /// Identifier of the first object found by walking `path` (slash-delimited) from the root
    pub fn find_path(&self, path: &str) -> Option<String> {
        let mut current = ROOT_ID.to_string();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = self
                .children_of(&current)
                .into_iter()
                .find(|(_, obj)| obj.name == segment)
                .map(|(id, _)| id.clone())?;
        }
        Some(current)
    }

    /// Content of a file
    pub fn content(&self, id: &str) -> Option<&[u8]> {
        self.objects
            .get(id)
            .filter(|obj| obj.kind == RemoteKind::File)
            .map(|obj| obj.content.as_slice())
    }

    /// Modification time of an object in whole seconds
    pub fn modified(&self, id: &str) -> Option<i64> {
        self.objects.get(id).map(|obj| obj.modified.timestamp())
    }

    /// Number of objects excluding the root
    pub fn object_count(&self) -> usize {
        self.objects.len() - 1
    }

    /// Create a folder chain for `path` (reusing existing folders), returning the last id
    pub fn put_folder(&mut self, path: &str) -> Result<String, SyncError> {
        let mut current = ROOT_ID.to_string();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            let existing = self
                .children_of(&current)
                .into_iter()
                .find(|(_, obj)| obj.name == segment && obj.kind == RemoteKind::Folder)
                .map(|(id, _)| id.clone());
            current = match existing {
                Some(id) => id,
                None => self.create_folder(segment, &current)?,
            };
        }
        Ok(current)
    }

    /// Upload a file at `path`, creating parent folders as needed
    pub fn put_file(&mut self, path: &str, content: &[u8], mtime: i64) -> Result<String, SyncError> {
        let (parent, name) = match path.trim_matches('/').rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", path.trim_matches('/')),
        };
        let parent_id = self.put_folder(parent)?;
        self.upload_file(name, &parent_id, content, mtime)
    }

    fn children_of(&self, folder_id: &str) -> Vec<(&String, &RemoteObject)> {
        let mut children: Vec<_> = self
            .objects
            .iter()
            .filter(|(_, obj)| obj.parent.as_deref() == Some(folder_id))
            .collect();
        children.sort_by(|(a_id, a), (b_id, b)| a.name.cmp(&b.name).then(a_id.cmp(b_id)));
        children
    }

    fn object(&self, id: &str) -> Result<&RemoteObject, SyncError> {
        self.objects.get(id).ok_or_else(|| SyncError::NotFound { id: id.to_string() })
    }

    fn object_mut(&mut self, id: &str) -> Result<&mut RemoteObject, SyncError> {
        self.objects
            .get_mut(id)
            .ok_or_else(|| SyncError::NotFound { id: id.to_string() })
    }

    fn folder(&self, id: &str) -> Result<&RemoteObject, SyncError> {
        let obj = self.object(id)?;
        if obj.kind != RemoteKind::Folder {
            return Err(SyncError::Remote(format!("{} is not a folder", id)));
        }
        Ok(obj)
    }

    fn allocate_id(&mut self) -> String {
        let id = format!("id{:08}", self.next_id);
        self.next_id += 1;
        id
    }

    fn insert_object(
        &mut self,
        name: &str,
        parent_id: &str,
        kind: RemoteKind,
        modified: DateTime<Utc>,
        content: Vec<u8>,
    ) -> Result<String, SyncError> {
        self.folder(parent_id)?;
        let id = self.allocate_id();
        self.objects.insert(
            id.clone(),
            RemoteObject {
                name: name.to_string(),
                parent: Some(parent_id.to_string()),
                kind,
                modified,
                content,
            },
        );
        self.mutations += 1;
        Ok(id)
    }

    fn is_descendant(&self, id: &str, ancestor: &str) -> bool {
        let mut current = self.objects.get(id).and_then(|obj| obj.parent.clone());
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.objects.get(&parent).and_then(|obj| obj.parent.clone());
        }
        false
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for MemoryRemote {
    fn root_id(&self) -> String {
        ROOT_ID.to_string()
    }

    fn list_children(
        &mut self,
        folder_id: &str,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<RemotePage, SyncError> {
        self.folder(folder_id)?;
        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| SyncError::Remote(format!("Invalid page token '{}'", token)))?,
            None => 0,
        };
        let page_size = page_size.max(1);

        let children = self.children_of(folder_id);
        let items = children
            .iter()
            .skip(offset)
            .take(page_size)
            .map(|(id, obj)| RemoteItem {
                id: (*id).clone(),
                name: obj.name.clone(),
                kind: obj.kind,
                mtime: obj.modified.timestamp(),
            })
            .collect();
        let next_page_token = if offset + page_size < children.len() {
            Some((offset + page_size).to_string())
        } else {
            None
        };

        Ok(RemotePage {
            items,
            next_page_token,
        })
    }

    fn create_folder(&mut self, name: &str, parent_id: &str) -> Result<String, SyncError> {
        self.insert_object(name, parent_id, RemoteKind::Folder, now_seconds(), Vec::new())
    }

    fn upload_file(
        &mut self,
        name: &str,
        parent_id: &str,
        content: &[u8],
        mtime: i64,
    ) -> Result<String, SyncError> {
        let modified = timestamp(mtime)?;
        self.insert_object(name, parent_id, RemoteKind::File, modified, content.to_vec())
    }

    fn update_file(&mut self, id: &str, content: &[u8], mtime: i64) -> Result<(), SyncError> {
        let modified = timestamp(mtime)?;
        let obj = self.object_mut(id)?;
        if obj.kind != RemoteKind::File {
            return Err(SyncError::Remote(format!("{} is not a file", id)));
        }
        obj.content = content.to_vec();
        obj.modified = modified;
        self.mutations += 1;
        Ok(())
    }

    fn download_file(&mut self, id: &str) -> Result<Vec<u8>, SyncError> {
        let obj = self.object(id)?;
        if obj.kind != RemoteKind::File {
            return Err(SyncError::Remote(format!("{} is not a file", id)));
        }
        Ok(obj.content.clone())
    }

    fn delete(&mut self, id: &str) -> Result<(), SyncError> {
        if id == ROOT_ID {
            return Err(SyncError::Remote("The root folder cannot be deleted".to_string()));
        }
        self.object(id)?;

        let mut doomed = vec![id.to_string()];
        let mut index = 0;
        while index < doomed.len() {
            let parent = doomed[index].clone();
            doomed.extend(
                self.objects
                    .iter()
                    .filter(|(_, obj)| obj.parent.as_deref() == Some(parent.as_str()))
                    .map(|(child, _)| child.clone()),
            );
            index += 1;
        }
        for doomed_id in doomed {
            self.objects.remove(&doomed_id);
        }
        self.mutations += 1;
        Ok(())
    }

    fn rename(&mut self, id: &str, new_name: &str) -> Result<(), SyncError> {
        let obj = self.object_mut(id)?;
        obj.name = new_name.to_string();
        self.mutations += 1;
        Ok(())
    }

    fn move_to(&mut self, id: &str, new_parent_id: &str) -> Result<(), SyncError> {
        self.folder(new_parent_id)?;
        self.object(id)?;
        if id == new_parent_id || self.is_descendant(new_parent_id, id) {
            return Err(SyncError::Remote(format!(
                "Cannot move {} into its own subtree",
                id
            )));
        }
        self.object_mut(id)?.parent = Some(new_parent_id.to_string());
        self.mutations += 1;
        Ok(())
    }

    fn search(
        &mut self,
        name: &str,
        parent_id: &str,
        scope: SearchScope,
    ) -> Result<Vec<String>, SyncError> {
        self.folder(parent_id)?;
        let mut ids: Vec<String> = self
            .objects
            .iter()
            .filter(|(_, obj)| {
                obj.parent.as_deref() == Some(parent_id) && obj.name == name && scope.admits(obj.kind)
            })
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn parent_id(&mut self, id: &str) -> Result<Option<String>, SyncError> {
        Ok(self.object(id)?.parent.clone())
    }
}

fn now_seconds() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::<Utc>::from_timestamp(now.timestamp(), 0).unwrap_or(now)
}

fn timestamp(mtime: i64) -> Result<DateTime<Utc>, SyncError> {
    DateTime::<Utc>::from_timestamp(mtime, 0)
        .ok_or_else(|| SyncError::Validation(format!("Modification time out of range: {}", mtime)))
}
