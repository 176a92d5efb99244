//! Store contracts the engine talks through
//!
//! The reconciliation core never touches the filesystem or the remote
//! service directly; it goes through [`LocalStore`] and [`RemoteStore`].
//! Implementations are responsible for classifying their failures into
//! [`SyncError`] variants (`Network` for anything transient).

mod local;
mod memory;

pub use local::FsLocalStore;
pub use memory::MemoryRemote;

use crate::types::SyncError;
use camino::Utf8Path;

/// Default number of children requested per listing page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Kind of a local directory child
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalKind {
    /// Regular file with its modification time in whole seconds
    File { mtime: i64 },
    Dir,
}

/// One immediate child of a local directory (symlinks never appear)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalChild {
    pub name: String,
    pub kind: LocalKind,
}

/// Local filesystem contract, all paths relative to the sync root
pub trait LocalStore {
    /// Immediate children of a directory, excluding symbolic links
    fn list_children(&self, dir: &Utf8Path) -> Result<Vec<LocalChild>, SyncError>;

    /// Kind of the object at `path`, `None` if nothing (or a symlink) is there
    fn kind(&self, path: &Utf8Path) -> Result<Option<LocalKind>, SyncError>;

    /// Modification time in whole seconds
    fn modified_time(&self, path: &Utf8Path) -> Result<i64, SyncError>;

    /// Read a whole file
    fn read_file(&self, path: &Utf8Path) -> Result<Vec<u8>, SyncError>;

    /// Replace a whole file and stamp its modification time
    fn write_file(&self, path: &Utf8Path, content: &[u8], mtime: i64) -> Result<(), SyncError>;

    /// Set a file's modification time
    fn set_modified_time(&self, path: &Utf8Path, mtime: i64) -> Result<(), SyncError>;

    /// Create a directory (and missing parents)
    fn create_dir(&self, path: &Utf8Path) -> Result<(), SyncError>;

    /// Remove a directory recursively
    fn remove_dir_all(&self, path: &Utf8Path) -> Result<(), SyncError>;

    /// Remove a single file
    fn remove_file(&self, path: &Utf8Path) -> Result<(), SyncError>;
}

/// Kind of a remote object
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteKind {
    File,
    Folder,
}

/// Object kinds a name search is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    Files,
    Folders,
    Any,
}

impl SearchScope {
    /// Check if an object of `kind` is in scope
    pub fn admits(self, kind: RemoteKind) -> bool {
        match self {
            SearchScope::Files => kind == RemoteKind::File,
            SearchScope::Folders => kind == RemoteKind::Folder,
            SearchScope::Any => true,
        }
    }
}

/// One child returned by a remote listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteItem {
    pub id: String,
    pub name: String,
    pub kind: RemoteKind,
    /// Modification time in whole seconds
    pub mtime: i64,
}

/// One page of a remote listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemotePage {
    pub items: Vec<RemoteItem>,
    /// Token for the next page, `None` on the last page
    pub next_page_token: Option<String>,
}

/// Remote object-storage contract
pub trait RemoteStore {
    /// Identifier of the store's top-level folder
    fn root_id(&self) -> String;

    /// One page of a folder's immediate children
    fn list_children(
        &mut self,
        folder_id: &str,
        page_token: Option<&str>,
        page_size: usize,
    ) -> Result<RemotePage, SyncError>;

    /// Create a folder, returning its identifier
    fn create_folder(&mut self, name: &str, parent_id: &str) -> Result<String, SyncError>;

    /// Upload a new file, returning its identifier
    fn upload_file(
        &mut self,
        name: &str,
        parent_id: &str,
        content: &[u8],
        mtime: i64,
    ) -> Result<String, SyncError>;

    /// Replace an existing file's content and modification time
    fn update_file(&mut self, id: &str, content: &[u8], mtime: i64) -> Result<(), SyncError>;

    /// Download a file's content
    fn download_file(&mut self, id: &str) -> Result<Vec<u8>, SyncError>;

    /// Delete one object (folders take their contents with them)
    fn delete(&mut self, id: &str) -> Result<(), SyncError>;

    /// Delete several objects in one request
    ///
    /// Returns the identifiers that were already gone.
    fn delete_batch(&mut self, ids: &[String]) -> Result<Vec<String>, SyncError> {
        let mut missing = Vec::new();
        for id in ids {
            match self.delete(id) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => missing.push(id.clone()),
                Err(e) => return Err(e),
            }
        }
        Ok(missing)
    }

    /// Rename an object in place
    fn rename(&mut self, id: &str, new_name: &str) -> Result<(), SyncError>;

    /// Move an object under another folder
    fn move_to(&mut self, id: &str, new_parent_id: &str) -> Result<(), SyncError>;

    /// Identifiers of objects named exactly `name` directly under `parent_id`
    fn search(
        &mut self,
        name: &str,
        parent_id: &str,
        scope: SearchScope,
    ) -> Result<Vec<String>, SyncError>;

    /// Parent folder of an object, `None` for the root
    fn parent_id(&mut self, id: &str) -> Result<Option<String>, SyncError>;
}
