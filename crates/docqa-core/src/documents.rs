//! Loading PDF documents from paths given by the user.
//!
//! Files are read whole into memory; directories contribute every `.pdf` below them.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// A supplied document: its name and raw bytes. Dropped once its text is extracted.
#[derive(Debug, Clone)]
pub struct Document {
    /// File name, used in logs and errors.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let bytes = std::fs::read(path).map_err(|e| DocumentError::Read(path.to_path_buf(), e))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }
}

/// Loads every document named by `paths`, in order.
///
/// A file is taken as-is whatever its extension. A directory is walked
/// recursively (hidden entries skipped, sorted by name) for `.pdf` files.
pub fn load_documents<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Document>, DocumentError> {
    let mut docs = Vec::new();
    for path in paths {
        for file in resolve_path(path.as_ref())? {
            docs.push(Document::from_path(&file)?);
        }
    }
    Ok(docs)
}

fn resolve_path(path: &Path) -> Result<Vec<PathBuf>, DocumentError> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        return Err(DocumentError::NotFound(path.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(path)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
    {
        let entry = entry.map_err(|e| DocumentError::Walk(e.to_string()))?;
        if entry.file_type().is_file() && is_pdf(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("no such file or directory: {0}")]
    NotFound(PathBuf),
    #[error("walk error: {0}")]
    Walk(String),
    #[error("read error for {0}: {1}")]
    Read(PathBuf, std::io::Error),
}
