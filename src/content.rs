//! Content collaborators: where pane bodies come from and where they live
//! once loaded. The layout only stores descriptors; the bytes are here.

use std::collections::HashMap;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

use crate::layout::{Pane, PaneId};

/// Default cap on a document's size.
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("access denied: {0} is outside of the documents directory")]
    AccessDenied(String),

    #[error("file does not exist: {0}")]
    NotFound(String),

    #[error("path is not a file: {0}")]
    NotAFile(String),

    #[error("file too large: {filename} is {size} bytes (max: {max} bytes)")]
    TooLarge { filename: String, size: u64, max: u64 },

    #[error("file {0} must be UTF-8 encoded")]
    NotUtf8(String),

    #[error("cannot read file {filename}: {source}")]
    Io {
        filename: String,
        source: std::io::Error,
    },
}

/// A pane whose body must be fetched by a [`ContentLoader`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentRequest {
    pub pane: PaneId,
    pub filename: String,
    /// Issued by [`ContentCache::begin`]. Only the latest ticket for a pane is accepted.
    pub ticket: u64,
}

impl ContentRequest {
    pub fn for_pane(pane: &Pane) -> Option<Self> {
        pane.content.needs_load().then(|| Self {
            pane: pane.id,
            filename: pane.content.filename.clone(),
            ticket: 0,
        })
    }
}

/// Fetches the body of an externally-loaded pane.
pub trait ContentLoader: Send + Sync {
    fn load(&self, filename: &str) -> impl Future<Output = Result<String, ContentError>> + Send;
}

/// Reads UTF-8 documents from a single directory.
#[derive(Clone, Debug)]
pub struct FsContentLoader {
    docs_dir: PathBuf,
    max_size: u64,
}

impl FsContentLoader {
    pub fn new(docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            max_size: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }

    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    /// Map `filename` into the documents directory. Paths that climb out of
    /// it, or are absolute, are refused.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, ContentError> {
        let mut relative = PathBuf::new();
        for component in Path::new(filename).components() {
            match component {
                Component::Normal(part) => relative.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !relative.pop() {
                        return Err(ContentError::AccessDenied(filename.to_string()));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(ContentError::AccessDenied(filename.to_string()));
                }
            }
        }
        if relative.as_os_str().is_empty() {
            return Err(ContentError::NotAFile(filename.to_string()));
        }
        Ok(self.docs_dir.join(relative))
    }

    /// Markdown files directly inside the documents directory, sorted.
    pub async fn list_documents(&self) -> Result<Vec<String>, ContentError> {
        let dir_name = self.docs_dir.display().to_string();
        let mut entries = tokio::fs::read_dir(&self.docs_dir)
            .await
            .map_err(|e| io_error(&dir_name, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| io_error(&dir_name, e))? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if is_file && name.to_lowercase().ends_with(".md") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}

impl ContentLoader for FsContentLoader {
    async fn load(&self, filename: &str) -> Result<String, ContentError> {
        let path = self.resolve(filename)?;
        let meta = tokio::fs::metadata(&path).await.map_err(|e| io_error(filename, e))?;
        if !meta.is_file() {
            return Err(ContentError::NotAFile(filename.to_string()));
        }
        if meta.len() > self.max_size {
            return Err(ContentError::TooLarge {
                filename: filename.to_string(),
                size: meta.len(),
                max: self.max_size,
            });
        }

        let bytes = tokio::fs::read(&path).await.map_err(|e| io_error(filename, e))?;
        let text = String::from_utf8(bytes).map_err(|_| ContentError::NotUtf8(filename.to_string()))?;
        trace!(filename, bytes = text.len(), "loaded document");
        Ok(text)
    }
}

fn io_error(filename: &str, source: std::io::Error) -> ContentError {
    match source.kind() {
        ErrorKind::NotFound => ContentError::NotFound(filename.to_string()),
        _ => ContentError::Io {
            filename: filename.to_string(),
            source,
        },
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentState {
    Loading,
    Ready(String),
    Failed(String),
}

/// Loaded pane bodies, keyed by pane. Only registered panes accept results.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: HashMap<PaneId, ContentState>,
    tickets: HashMap<PaneId, u64>,
    last_ticket: u64,
}

impl ContentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `pane` as loading and return the ticket its result must carry.
    /// Tickets keep increasing across [`clear`](Self::clear).
    pub fn begin(&mut self, pane: PaneId) -> u64 {
        self.last_ticket += 1;
        self.entries.insert(pane, ContentState::Loading);
        self.tickets.insert(pane, self.last_ticket);
        self.last_ticket
    }

    /// Store a finished load. Results for panes that were forgotten, or that
    /// were asked for again since, are dropped and `false` is returned.
    pub fn complete(&mut self, pane: PaneId, ticket: u64, result: Result<String, ContentError>) -> bool {
        if self.tickets.get(&pane) != Some(&ticket) {
            debug!(pane = %pane, ticket, "dropped stale content");
            return false;
        }
        let Some(entry) = self.entries.get_mut(&pane) else {
            return false;
        };
        *entry = match result {
            Ok(text) => ContentState::Ready(text),
            Err(e) => ContentState::Failed(e.to_string()),
        };
        true
    }

    pub fn forget(&mut self, pane: PaneId) {
        self.entries.remove(&pane);
        self.tickets.remove(&pane);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.tickets.clear();
    }

    pub fn get(&self, pane: PaneId) -> Option<&ContentState> {
        self.entries.get(&pane)
    }

    pub fn text(&self, pane: PaneId) -> Option<&str> {
        match self.entries.get(&pane)? {
            ContentState::Ready(text) => Some(text),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ContentDescriptor;

    fn loader_with(files: &[(&str, &[u8])]) -> (tempfile::TempDir, FsContentLoader) {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(name), body).unwrap();
        }
        let loader = FsContentLoader::new(dir.path());
        (dir, loader)
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let loader = FsContentLoader::new("/srv/docs");
        assert_eq!(loader.resolve("a.md").unwrap(), PathBuf::from("/srv/docs/a.md"));
        assert_eq!(loader.resolve("sub/../b.md").unwrap(), PathBuf::from("/srv/docs/b.md"));
        assert!(matches!(loader.resolve("../secret"), Err(ContentError::AccessDenied(_))));
        assert!(matches!(loader.resolve("sub/../../x"), Err(ContentError::AccessDenied(_))));
        assert!(matches!(loader.resolve("/etc/passwd"), Err(ContentError::AccessDenied(_))));
        assert!(matches!(loader.resolve("."), Err(ContentError::NotAFile(_))));
    }

    #[tokio::test]
    async fn test_load_document() {
        let (_dir, loader) = loader_with(&[("a.md", b"# Title\n")]);
        assert_eq!(loader.load("a.md").await.unwrap(), "# Title\n");
    }

    #[tokio::test]
    async fn test_load_missing_and_directory() {
        let (dir, loader) = loader_with(&[]);
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        assert!(matches!(loader.load("nope.md").await, Err(ContentError::NotFound(_))));
        assert!(matches!(loader.load("sub").await, Err(ContentError::NotAFile(_))));
    }

    #[tokio::test]
    async fn test_load_enforces_size_cap() {
        let (_dir, loader) = loader_with(&[("big.md", &[b'x'; 64])]);
        let loader = loader.with_max_size(32);
        let err = loader.load("big.md").await.unwrap_err();
        assert!(matches!(err, ContentError::TooLarge { size: 64, max: 32, .. }));
    }

    #[tokio::test]
    async fn test_load_rejects_invalid_utf8() {
        let (_dir, loader) = loader_with(&[("bin.md", &[0xff, 0xfe, 0x00])]);
        assert!(matches!(loader.load("bin.md").await, Err(ContentError::NotUtf8(_))));
    }

    #[tokio::test]
    async fn test_list_documents_sorted_markdown_only() {
        let (dir, loader) = loader_with(&[("b.md", b""), ("A.MD", b""), ("c.txt", b"")]);
        std::fs::create_dir(dir.path().join("folder.md")).unwrap();
        assert_eq!(loader.list_documents().await.unwrap(), vec!["A.MD", "b.md"]);
    }

    #[test]
    fn test_request_only_for_documents() {
        let doc = Pane::new(ContentDescriptor::document("a.md"));
        let term = Pane::new(ContentDescriptor::terminal("shell"));
        assert_eq!(ContentRequest::for_pane(&doc).unwrap().filename, "a.md");
        assert!(ContentRequest::for_pane(&term).is_none());
    }

    #[test]
    fn test_cache_drops_stale_completion() {
        let mut cache = ContentCache::new();
        let pane = PaneId::new_v4();
        let ticket = cache.begin(pane);
        assert_eq!(cache.get(pane), Some(&ContentState::Loading));
        cache.forget(pane);
        assert!(!cache.complete(pane, ticket, Ok("late".into())));
        assert!(cache.get(pane).is_none());
    }

    #[test]
    fn test_cache_only_accepts_latest_ticket() {
        let mut cache = ContentCache::new();
        let pane = PaneId::new_v4();
        let first = cache.begin(pane);
        cache.clear();
        let second = cache.begin(pane);
        assert_ne!(first, second);

        assert!(!cache.complete(pane, first, Ok("old".into())));
        assert_eq!(cache.get(pane), Some(&ContentState::Loading));
        assert!(cache.complete(pane, second, Ok("new".into())));
        assert_eq!(cache.text(pane), Some("new"));
    }

    #[test]
    fn test_cache_records_results() {
        let mut cache = ContentCache::new();
        let (ok, bad) = (PaneId::new_v4(), PaneId::new_v4());
        let ok_ticket = cache.begin(ok);
        let bad_ticket = cache.begin(bad);
        assert!(cache.complete(ok, ok_ticket, Ok("body".into())));
        assert!(cache.complete(bad, bad_ticket, Err(ContentError::NotFound("x.md".into()))));
        assert_eq!(cache.text(ok), Some("body"));
        assert!(matches!(cache.get(bad), Some(ContentState::Failed(msg)) if msg.contains("x.md")));
        assert_eq!(cache.len(), 2);
    }
}
