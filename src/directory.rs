//! Mapping between a document and a directory of page files

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::document::Map16Document;
use crate::error::{FilesystemError, Result};
use crate::text::{Formatter, Parser};

pub const PAGE_FILE_EXTENSION: &str = "txt";
const PAGE_INDEX_DIGITS: usize = 3;
const STAGING_PREFIX: &str = ".map16-";

/// File name for a page, e.g. `01F.txt`
///
/// Fixed-width upper-case hex keeps lexicographic order equal to page order.
pub fn page_file_name(index: usize) -> String {
    format!("{:03X}.{}", index, PAGE_FILE_EXTENSION)
}

/// Inverse of [`page_file_name`]; anything else is not a page file
pub fn parse_page_file_name(name: &str) -> Option<usize> {
    let stem = name.strip_suffix(PAGE_FILE_EXTENSION)?.strip_suffix('.')?;
    if stem.len() != PAGE_INDEX_DIGITS
        || !stem.bytes().all(|b| matches!(b, b'0'..=b'9' | b'A'..=b'F'))
    {
        return None;
    }
    usize::from_str_radix(stem, 16).ok()
}

/// Write one file per page into `dir`, which must be absent or empty
///
/// Pages are written into a staging directory beside `dir` that is renamed into
/// place once complete, so a failure never leaves a partial `dir` behind.
pub fn write_pages(dir: &Path, doc: &Map16Document) -> Result<()> {
    ensure_writable_target(dir)?;

    let parent = parent_dir(dir);
    fs::create_dir_all(parent).map_err(|source| FilesystemError::CreateFailed {
        path: parent.to_path_buf(),
        source,
    })?;

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(parent)
        .map_err(|source| FilesystemError::CreateFailed {
            path: dir.to_path_buf(),
            source,
        })?;

    let formatter = Formatter::new();
    for (index, page) in doc.pages().iter().enumerate() {
        let path = staging.path().join(page_file_name(index));
        fs::write(&path, formatter.format_page(page))
            .map_err(|source| FilesystemError::WriteFailed { path, source })?;
        log::debug!("staged page {:03X}", index);
    }

    move_into_place(staging.path(), dir).map_err(|source| FilesystemError::CreateFailed {
        path: dir.to_path_buf(),
        source,
    })?;
    let _ = staging.keep();

    log::info!("wrote {} page files to {}", doc.page_count(), dir.display());
    Ok(())
}

/// Collect and parse the page files in `dir`
pub fn read_pages(dir: &Path) -> Result<Map16Document> {
    let files = collect_page_files(dir)?;
    let parser = Parser::new();

    let mut pages = Vec::with_capacity(files.len());
    for (index, path) in files.iter().enumerate() {
        let bytes = fs::read(path).map_err(|source| FilesystemError::ReadFailed {
            path: path.clone(),
            source,
        })?;
        pages.push(parser.parse_page_bytes(index, &bytes)?);
        log::debug!("parsed {}", path.display());
    }

    Ok(Map16Document::new(pages)?)
}

/// Page file paths in page order, after checking the directory holds nothing else
pub fn collect_page_files(dir: &Path) -> std::result::Result<Vec<PathBuf>, FilesystemError> {
    if !dir.is_dir() {
        let source = match fs::metadata(dir) {
            Ok(_) => io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            Err(err) => err,
        };
        return Err(FilesystemError::ReadFailed {
            path: dir.to_path_buf(),
            source,
        });
    }

    let mut pages = BTreeMap::new();
    let mut unexpected = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| FilesystemError::ReadFailed {
            path: err.path().unwrap_or(dir).to_path_buf(),
            source: err.into(),
        })?;

        let index = entry.file_name().to_str().and_then(parse_page_file_name);
        match index {
            Some(index) if entry.file_type().is_file() => {
                pages.insert(index, entry.into_path());
            }
            _ => unexpected.push(entry.into_path()),
        }
    }

    if !unexpected.is_empty() {
        return Err(FilesystemError::UnexpectedEntries {
            dir: dir.to_path_buf(),
            entries: unexpected,
        });
    }

    let count = pages.keys().next_back().map_or(0, |&last| last + 1);
    let missing: Vec<usize> = (0..count.max(1))
        .filter(|index| !pages.contains_key(index))
        .collect();
    if !missing.is_empty() {
        return Err(FilesystemError::MissingPages {
            dir: dir.to_path_buf(),
            missing,
        });
    }

    Ok(pages.into_values().collect())
}

fn ensure_writable_target(dir: &Path) -> std::result::Result<(), FilesystemError> {
    let exists = || FilesystemError::TargetExists {
        path: dir.to_path_buf(),
    };

    match fs::symlink_metadata(dir) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(FilesystemError::ReadFailed {
            path: dir.to_path_buf(),
            source,
        }),
        Ok(meta) if !meta.is_dir() => Err(exists()),
        Ok(_) => {
            let mut entries = fs::read_dir(dir).map_err(|source| FilesystemError::ReadFailed {
                path: dir.to_path_buf(),
                source,
            })?;
            if entries.next().is_some() {
                Err(exists())
            } else {
                Ok(())
            }
        }
    }
}

/// Rename `staging` to `dir`, which is absent or an empty directory
#[cfg(unix)]
fn move_into_place(staging: &Path, dir: &Path) -> io::Result<()> {
    // rename(2) replaces an empty directory atomically
    fs::rename(staging, dir)
}

/// Rename `staging` to `dir`, which is absent or an empty directory
#[cfg(not(unix))]
fn move_into_place(staging: &Path, dir: &Path) -> io::Result<()> {
    let replaced = dir.is_dir();
    if replaced {
        fs::remove_dir(dir)?;
    }
    fs::rename(staging, dir).map_err(|err| {
        if replaced {
            let _ = fs::create_dir(dir);
        }
        err
    })
}

/// Directory that will hold `path`, `.` for bare relative names
pub(crate) fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
