//! Local content mirror access
//!
//! Post bodies are not stored in the database; they are read on demand from
//! the mirror directory the sync engine maintains.

use bridge_traits::storage::FileSystemAccess;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

use crate::error::{LibraryError, Result};

/// Body returned when a mirror file is missing or unreadable.
pub const CONTENT_PLACEHOLDER: &str = "Content not available.";

const DELIMITER: &str = "---";

/// A document split at its front matter delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatterBlock<'a> {
    /// Header text between the `---` lines, `None` when the file has no header
    pub header: Option<&'a str>,
    pub body: &'a str,
}

/// Split raw file content into front matter header and markdown body.
///
/// The header must start on the first line (after an optional BOM) with a
/// line containing only `---` and end at the next such line. Files that do
/// not start with `---` are all body.
///
/// # Errors
///
/// Returns `InvalidInput` when the opening delimiter is never closed.
///
/// # Examples
///
/// ```
/// use core_library::content::split_front_matter;
///
/// let block = split_front_matter("---\ntitle: Hi\n---\nBody").unwrap();
/// assert_eq!(block.header, Some("title: Hi\n"));
/// assert_eq!(block.body, "Body");
/// ```
pub fn split_front_matter(raw: &str) -> Result<FrontMatterBlock<'_>> {
    let text = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut lines = text.split_inclusive('\n');

    let opens = lines
        .next()
        .map(|line| line.trim_end() == DELIMITER)
        .unwrap_or(false);
    if !opens {
        return Ok(FrontMatterBlock {
            header: None,
            body: text,
        });
    }

    let header_start = text.find('\n').map(|i| i + 1).unwrap_or(text.len());
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == DELIMITER {
            return Ok(FrontMatterBlock {
                header: Some(&text[header_start..offset]),
                body: &text[offset + line.len()..],
            });
        }
        offset += line.len();
    }

    Err(LibraryError::invalid(
        "front_matter",
        "opening --- has no closing delimiter",
    ))
}

/// Resolve a document path below `root`, refusing paths that escape it.
pub fn resolve_under(root: &Path, file_path: &str) -> Result<PathBuf> {
    let relative = Path::new(file_path);
    if file_path.trim().is_empty() {
        return Err(LibraryError::invalid("file_path", "path is empty"));
    }

    let escapes = relative.components().any(|component| {
        !matches!(component, Component::Normal(_) | Component::CurDir)
    });
    if escapes {
        return Err(LibraryError::invalid(
            "file_path",
            format!("{} is not a relative path inside the content root", file_path),
        ));
    }

    Ok(root.join(relative))
}

/// Read-only view of the content mirror.
#[derive(Clone)]
pub struct ContentMirror {
    fs: Arc<dyn FileSystemAccess>,
    root: PathBuf,
}

impl ContentMirror {
    pub fn new(fs: Arc<dyn FileSystemAccess>, root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, file_path: &str) -> Result<PathBuf> {
        resolve_under(&self.root, file_path)
    }

    /// Markdown body of a mirrored document.
    ///
    /// Any failure (bad path, missing file, invalid UTF-8, unclosed header)
    /// is logged and yields [`CONTENT_PLACEHOLDER`].
    pub async fn read_body(&self, file_path: &str) -> String {
        match self.try_read_body(file_path).await {
            Ok(body) => body,
            Err(e) => {
                warn!(file_path, error = %e, "Falling back to placeholder content");
                CONTENT_PLACEHOLDER.to_string()
            }
        }
    }

    async fn try_read_body(&self, file_path: &str) -> Result<String> {
        let path = self.resolve(file_path)?;
        let raw = self.fs.read_to_string(&path).await?;
        let block = split_front_matter(&raw)?;
        Ok(block.body.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_without_header() {
        let block = split_front_matter("# Just markdown\n").unwrap();
        assert_eq!(block.header, None);
        assert_eq!(block.body, "# Just markdown\n");
    }

    #[test]
    fn test_split_handles_crlf_and_bom() {
        let raw = "\u{feff}---\r\ntitle: Hi\r\n---\r\nBody\r\n";
        let block = split_front_matter(raw).unwrap();
        assert_eq!(block.header, Some("title: Hi\r\n"));
        assert_eq!(block.body, "Body\r\n");
    }

    #[test]
    fn test_split_empty_header() {
        let block = split_front_matter("---\n---\nBody").unwrap();
        assert_eq!(block.header, Some(""));
        assert_eq!(block.body, "Body");
    }

    #[test]
    fn test_split_ignores_later_rules() {
        let raw = "---\na: 1\n---\nText\n\n---\n\nMore";
        let block = split_front_matter(raw).unwrap();
        assert_eq!(block.header, Some("a: 1\n"));
        assert_eq!(block.body, "Text\n\n---\n\nMore");
    }

    #[test]
    fn test_split_unclosed_header_is_error() {
        assert!(split_front_matter("---\ntitle: Hi\nBody").is_err());
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let root = Path::new("/srv/content");
        assert_eq!(
            resolve_under(root, "music/jazz/song.md").unwrap(),
            PathBuf::from("/srv/content/music/jazz/song.md")
        );
        assert!(resolve_under(root, "../etc/passwd").is_err());
        assert!(resolve_under(root, "/etc/passwd").is_err());
        assert!(resolve_under(root, "a/../../b.md").is_err());
        assert!(resolve_under(root, "").is_err());
    }
}
