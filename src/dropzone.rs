//! Drop/click target validation.
//!
//! The dropzone is the only gate between user gestures and the controller's
//! selection: anything it refuses never reaches
//! [`crate::UploadController::set_selection`].

use crate::config::UploaderConfig;
use crate::error::DropRejection;
use crate::selection::FileHandle;
use tracing::warn;

/// Limits applied to dropped or picked files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropzone {
    max_files: usize,
    max_size: u64,
    accept_hint: String,
}

impl Dropzone {
    pub fn new(max_files: usize, max_size: u64, accept_hint: impl Into<String>) -> Self {
        Self {
            max_files,
            max_size,
            accept_hint: accept_hint.into(),
        }
    }

    pub fn from_config(config: &UploaderConfig) -> Self {
        Self::new(config.max_files, config.max_file_size, config.accept_hint.clone())
    }

    pub fn max_files(&self) -> usize {
        self.max_files
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn accept_hint(&self) -> &str {
        &self.accept_hint
    }

    /// Validate `incoming` against the files already `held`.
    ///
    /// Returns the new full file list on success. The whole drop is refused
    /// if any file is oversized or if the combined count would exceed
    /// `max_files`; in that case `held` is to be left untouched.
    pub fn accept(
        &self,
        held: &[FileHandle],
        incoming: Vec<FileHandle>,
    ) -> Result<Vec<FileHandle>, DropRejection> {
        if incoming.is_empty() {
            return Err(DropRejection::NothingDropped);
        }

        if let Some(big) = incoming.iter().find(|f| f.size() > self.max_size) {
            let rejection = DropRejection::FileTooLarge {
                name: big.name().to_string(),
                size: big.size(),
                limit: self.max_size,
            };
            warn!(%rejection, "Dropzone rejected file");
            return Err(rejection);
        }

        if held.len() + incoming.len() > self.max_files {
            let rejection = DropRejection::TooManyFiles {
                max: self.max_files,
            };
            warn!(
                held = held.len(),
                incoming = incoming.len(),
                %rejection,
                "Dropzone rejected drop"
            );
            return Err(rejection);
        }

        let mut files = held.to_vec();
        files.extend(incoming);
        Ok(files)
    }
}

impl Default for Dropzone {
    fn default() -> Self {
        Self::from_config(&UploaderConfig::default())
    }
}
