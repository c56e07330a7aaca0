use std::path::PathBuf;

/// Kind of a record inside an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One unit of extraction work, reported back once the entry has been handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub relative_path: PathBuf,
    pub kind: EntryKind,
}
