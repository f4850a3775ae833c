//! Text directory to map16 file conversion

use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::binary;
use crate::directory::{self, parent_dir};
use crate::document::Map16Document;
use crate::error::{FilesystemError, Result};

/// Converts a directory of page files into a binary map16 file
pub struct Encoder {
    /// Replace an existing output file
    overwrite: bool,
}

impl Encoder {
    /// Create a new encoder that refuses to replace existing files
    pub fn new() -> Self {
        Self { overwrite: false }
    }

    /// Allow replacing an existing output file
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Collect and encode a page directory without writing anything
    pub fn encode_to_bytes(&self, input_dir: &Path) -> Result<Vec<u8>> {
        let doc = directory::read_pages(input_dir)?;
        Ok(binary::encode_bytes(&doc))
    }

    /// Encode `input_dir` into `output_file`
    pub fn encode(&self, input_dir: &Path, output_file: &Path) -> Result<Map16Document> {
        if !self.overwrite && output_file.exists() {
            return Err(FilesystemError::TargetExists {
                path: output_file.to_path_buf(),
            }
            .into());
        }

        let doc = directory::read_pages(input_dir)?;
        let bytes = binary::encode_bytes(&doc);
        self.write_atomically(output_file, &bytes)?;

        log::info!(
            "encoded {} ({} pages) into {}",
            input_dir.display(),
            doc.page_count(),
            output_file.display()
        );
        Ok(doc)
    }

    /// Write through a temporary file in the destination directory, then persist
    fn write_atomically(&self, path: &Path, bytes: &[u8]) -> std::result::Result<(), FilesystemError> {
        let write_failed = |source: io::Error| FilesystemError::WriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let parent = parent_dir(path);
        std::fs::create_dir_all(parent).map_err(|source| FilesystemError::CreateFailed {
            path: parent.to_path_buf(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(write_failed)?;
        tmp.write_all(bytes).map_err(write_failed)?;
        tmp.as_file().sync_all().map_err(write_failed)?;

        let persisted = if self.overwrite {
            tmp.persist(path)
        } else {
            tmp.persist_noclobber(path)
        };
        match persisted {
            Ok(_) => Ok(()),
            Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                Err(FilesystemError::TargetExists {
                    path: path.to_path_buf(),
                })
            }
            Err(err) => Err(write_failed(err.error)),
        }
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}
