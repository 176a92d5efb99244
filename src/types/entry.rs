//! FileEntry / DirEntry - Immediate children of one directory snapshot

/// A file inside a directory snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// File name (single path segment)
    pub name: String,

    /// Remote identifier; always set on the remote side, absent locally
    pub remote_id: Option<String>,

    /// Modification time, whole seconds since the Unix epoch
    pub mtime: i64,
}

impl FileEntry {
    /// Create a local-side entry
    pub fn local(name: impl Into<String>, mtime: i64) -> Self {
        Self {
            name: name.into(),
            remote_id: None,
            mtime,
        }
    }

    /// Create a remote-side entry
    pub fn remote(name: impl Into<String>, id: impl Into<String>, mtime: i64) -> Self {
        Self {
            name: name.into(),
            remote_id: Some(id.into()),
            mtime,
        }
    }
}

/// A subdirectory inside a directory snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Directory name (single path segment)
    pub name: String,

    /// Remote identifier; always set on the remote side, absent locally
    pub remote_id: Option<String>,
}

impl DirEntry {
    /// Create a local-side entry
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote_id: None,
        }
    }

    /// Create a remote-side entry
    pub fn remote(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            remote_id: Some(id.into()),
        }
    }
}
