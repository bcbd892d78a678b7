//! The user's file selection: [`FileHandle`] and [`SelectionState`].

use crate::error::UploaderError;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A file picked by the user, held entirely in memory.
#[derive(Clone, PartialEq, Eq)]
pub struct FileHandle {
    name: String,
    mime: String,
    content: Vec<u8>,
}

impl FileHandle {
    /// Wrap in-memory bytes. The MIME type is guessed from `name`'s extension.
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let mime = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            name,
            mime,
            content: content.into(),
        }
    }

    /// Override the guessed MIME type.
    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = mime.into();
        self
    }

    /// Load a local file into memory.
    ///
    /// The display name is the final path component. A file that does not
    /// start with the `%PDF` magic is still accepted (the document-type
    /// restriction is advertised, not enforced) but is logged at `warn`.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, UploaderError> {
        let path = path.as_ref();
        let content = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => UploaderError::FileNotFound {
                path: path.to_path_buf(),
            },
            std::io::ErrorKind::PermissionDenied => UploaderError::PermissionDenied {
                path: path.to_path_buf(),
            },
            _ => UploaderError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let name = display_name(path);
        let handle = Self::new(name, content);
        if !handle.looks_like_pdf() {
            warn!(
                file = %handle.name,
                "File does not look like a PDF; the endpoint may refuse it"
            );
        }
        debug!(file = %handle.name, size = handle.size(), mime = %handle.mime, "Loaded file");
        Ok(handle)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Size of the content in bytes.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// True when the content starts with the `%PDF` magic bytes.
    pub fn looks_like_pdf(&self) -> bool {
        self.content.starts_with(b"%PDF")
    }
}

// Content is omitted: a 4 MiB byte dump in a debug log helps nobody.
impl fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileHandle")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.size())
            .finish()
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| PathBuf::from(path).display().to_string())
}

/// The currently chosen file, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    /// Nothing selected. (initial state)
    #[default]
    Empty,
    /// One file waiting to be submitted.
    Holding(FileHandle),
}

impl SelectionState {
    /// Build a selection from a list of files, keeping the first.
    ///
    /// Extra files are dropped with a `warn` log; the dropzone normally
    /// prevents them from getting this far.
    pub fn from_files(files: Vec<FileHandle>) -> Self {
        let mut files = files.into_iter();
        match files.next() {
            None => SelectionState::Empty,
            Some(first) => {
                let extra: Vec<String> = files.map(|f| f.name).collect();
                if !extra.is_empty() {
                    warn!(kept = %first.name, dropped = ?extra, "Selection holds one file; ignoring the rest");
                }
                SelectionState::Holding(first)
            }
        }
    }

    pub fn file(&self) -> Option<&FileHandle> {
        match self {
            SelectionState::Empty => None,
            SelectionState::Holding(f) => Some(f),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SelectionState::Empty)
    }

    /// Number of held files (0 or 1).
    pub fn len(&self) -> usize {
        usize::from(!self.is_empty())
    }

    /// The held files as a list, in the shape the dropzone works with.
    pub fn to_files(&self) -> Vec<FileHandle> {
        self.file().cloned().into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn mime_is_guessed_from_extension() {
        assert_eq!(FileHandle::new("report.pdf", vec![]).mime(), "application/pdf");
        assert_eq!(
            FileHandle::new("blob", vec![1, 2]).mime(),
            "application/octet-stream"
        );
        assert_eq!(
            FileHandle::new("x.bin", vec![]).with_mime("text/plain").mime(),
            "text/plain"
        );
    }

    #[test]
    fn from_files_keeps_first() {
        let a = FileHandle::new("a.pdf", b"%PDF-1.7".to_vec());
        let b = FileHandle::new("b.pdf", b"%PDF-1.4".to_vec());
        let sel = SelectionState::from_files(vec![a.clone(), b]);
        assert_eq!(sel.file(), Some(&a));
        assert_eq!(sel.len(), 1);
        assert!(SelectionState::from_files(vec![]).is_empty());
    }

    #[test]
    fn debug_omits_content() {
        let f = FileHandle::new("secret.pdf", b"%PDF top secret".to_vec());
        let dbg = format!("{f:?}");
        assert!(dbg.contains("secret.pdf"));
        assert!(!dbg.contains("top secret"));
    }

    #[tokio::test]
    async fn from_path_reads_name_and_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.pdf");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"%PDF-1.7 body").unwrap();

        let handle = FileHandle::from_path(&path).await.unwrap();
        assert_eq!(handle.name(), "report.pdf");
        assert_eq!(handle.size(), 13);
        assert!(handle.looks_like_pdf());
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = FileHandle::from_path("/definitely/not/here.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, UploaderError::FileNotFound { .. }));
    }
}
