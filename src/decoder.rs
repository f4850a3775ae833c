//! map16 file to text directory conversion

use std::fs;
use std::path::Path;

use crate::binary;
use crate::directory;
use crate::document::Map16Document;
use crate::error::{FilesystemError, Result};

/// Converts a binary map16 file into a directory of page files
pub struct Decoder {
    // Currently stateless, but reserved for future options
}

impl Decoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self {}
    }

    /// Read and decode a map16 file without writing anything
    pub fn decode_file(&self, input_file: &Path) -> Result<Map16Document> {
        let bytes = fs::read(input_file).map_err(|source| FilesystemError::ReadFailed {
            path: input_file.to_path_buf(),
            source,
        })?;
        binary::decode_bytes(&bytes)
    }

    /// Decode `input_file` into `output_dir`, which must be absent or empty
    pub fn decode(&self, input_file: &Path, output_dir: &Path) -> Result<Map16Document> {
        let doc = self.decode_file(input_file)?;
        directory::write_pages(output_dir, &doc)?;

        log::info!(
            "decoded {} ({} pages) into {}",
            input_file.display(),
            doc.page_count(),
            output_dir.display()
        );
        Ok(doc)
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Page, HEADER_SIZE, PAGE_BYTE_SIZE};
    use crate::error::{Error, HeaderError, TileError};
    use tempfile::tempdir;

    fn blank_file(pages: u16) -> Vec<u8> {
        let mut bytes = b"MP16\x01\x00".to_vec();
        bytes.extend_from_slice(&pages.to_le_bytes());
        bytes.resize(HEADER_SIZE + usize::from(pages) * PAGE_BYTE_SIZE, 0);
        bytes
    }

    #[test]
    fn test_decode_writes_page_files() {
        let tmp = tempdir().unwrap();
        let input = tmp.path().join("level.map16");
        let output = tmp.path().join("level");
        fs::write(&input, blank_file(2)).unwrap();

        let doc = Decoder::new().decode(&input, &output).unwrap();

        assert_eq!(doc.pages(), &[Page::blank(), Page::blank()]);
        assert!(output.join("000.txt").is_file());
        assert!(output.join("001.txt").is_file());
        assert!(!output.join("002.txt").exists());
    }

    #[test]
    fn test_decode_missing_input() {
        let tmp = tempdir().unwrap();
        let result = Decoder::new().decode(&tmp.path().join("absent.map16"), &tmp.path().join("out"));

        assert!(matches!(
            result,
            Err(Error::Filesystem(FilesystemError::ReadFailed { .. }))
        ));
        assert!(!tmp.path().join("out").exists());
    }

    #[test]
    fn test_failed_decode_leaves_no_output() {
        let tmp = tempdir().unwrap();
        let input = tmp.path().join("bad.map16");
        let output = tmp.path().join("bad");

        let mut bytes = blank_file(3);
        let offset = HEADER_SIZE + 2 * PAGE_BYTE_SIZE + 12;
        bytes[offset + 3] = 0x80;
        fs::write(&input, bytes).unwrap();

        let result = Decoder::new().decode(&input, &output);
        assert!(matches!(
            result,
            Err(Error::Tile(TileError::ReservedBitsSet { .. }))
        ));
        assert!(!output.exists());

        fs::write(&input, b"not a map16 file").unwrap();
        assert!(matches!(
            Decoder::new().decode(&input, &output),
            Err(Error::Header(HeaderError::BadMagic { .. }))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_decode_refuses_populated_directory() {
        let tmp = tempdir().unwrap();
        let input = tmp.path().join("level.map16");
        let output = tmp.path().join("level");
        fs::write(&input, blank_file(1)).unwrap();

        Decoder::new().decode(&input, &output).unwrap();
        let again = Decoder::new().decode(&input, &output);

        assert!(matches!(
            again,
            Err(Error::Filesystem(FilesystemError::TargetExists { .. }))
        ));
    }
}
