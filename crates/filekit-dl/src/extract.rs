//! Sequential zip extraction.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Write as _},
    path::Path,
};

use filekit_utils::fs::ensure_dir_exists;
use tracing::debug;
use zip::ZipArchive;

use crate::{
    error::{DownloadError, ExtractError},
    types::{ArchiveEntry, EntryKind},
};

/// Extracts every file entry of the zip at `archive` below `destination`.
///
/// Entries are read one at a time in archive order. Directory entries produce no output of
/// their own since writing a file creates its parents. An entry is only reported once its
/// bytes are flushed, and the first failing entry aborts the whole extraction.
///
/// # Errors
///
/// [`DownloadError::ExtractionFailed`] wrapping the zip, I/O or path error that stopped it.
pub fn extract_zip(archive: &Path, destination: &Path) -> Result<Vec<ArchiveEntry>, DownloadError> {
    extract_entries(archive, destination).map_err(|source| {
        DownloadError::ExtractionFailed {
            archive: archive.to_path_buf(),
            source,
        }
    })
}

fn extract_entries(archive: &Path, destination: &Path) -> Result<Vec<ArchiveEntry>, ExtractError> {
    let file = File::open(archive)?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;
    let mut entries = Vec::with_capacity(zip.len());

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let relative_path = entry
            .enclosed_name()
            .ok_or_else(|| ExtractError::UnsafePath(entry.name().to_string()))?;

        debug!("unzip {}: {}", archive.display(), relative_path.display());

        if entry.is_dir() {
            entries.push(ArchiveEntry {
                relative_path,
                kind: EntryKind::Directory,
            });
            continue;
        }

        let target = destination.join(&relative_path);
        if let Some(parent) = target.parent() {
            ensure_dir_exists(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&target)?);
        io::copy(&mut entry, &mut writer)?;
        writer.flush()?;

        entries.push(ArchiveEntry {
            relative_path,
            kind: EntryKind::File,
        });
    }

    Ok(entries)
}
