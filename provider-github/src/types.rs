//! GitHub contents API response types
//!
//! See: https://docs.github.com/en/rest/repos/contents

use serde::Deserialize;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

/// One element of a directory listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentEntry {
    pub name: String,

    /// Path relative to the repository root
    pub path: String,

    #[serde(rename = "type")]
    pub kind: EntryKind,

    #[serde(default)]
    pub size: u64,
}

/// A single file fetched through the contents API.
#[derive(Debug, Clone, Deserialize)]
pub struct FileContent {
    pub path: String,

    /// Base64 payload with embedded newlines; empty for files over 1 MB
    #[serde(default)]
    pub content: Option<String>,

    /// `"base64"`, or `"none"` when the payload was omitted
    #[serde(default)]
    pub encoding: Option<String>,

    /// Raw download location, used when `content` is omitted
    #[serde(default)]
    pub download_url: Option<String>,
}

impl FileContent {
    pub fn is_inline(&self) -> bool {
        self.encoding.as_deref() == Some("base64")
            && self.content.as_deref().is_some_and(|c| !c.is_empty())
    }
}
