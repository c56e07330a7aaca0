//! Command-line construction for the detector.

use std::{
    ffi::{OsStr, OsString},
    path::Path,
};

use tracing::debug;

use crate::{error::FileError, options::DetectionOptions, FileResult};

/// Arguments for one detector run and the separator they select.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileArguments {
    pub args: Vec<OsString>,
    pub separator: char,
}

/// Builds the detector arguments for `path`.
///
/// The first candidate separator that does not occur in the path is chosen, so the echoed
/// path can always be cut off the output unambiguously. The path is passed as the last
/// argument, unchanged.
///
/// # Errors
///
/// [`FileError::SeparatorExhausted`] if every candidate occurs in the path.
pub fn build_arguments(path: &Path, options: &DetectionOptions) -> FileResult<FileArguments> {
    let candidates = options.candidates();
    let separator = candidates
        .iter()
        .copied()
        .find(|&c| !contains_char(path.as_os_str(), c))
        .ok_or_else(|| {
            FileError::SeparatorExhausted {
                path: path.to_path_buf(),
                attempted: candidates.clone(),
            }
        })?;

    let mut args = Vec::with_capacity(4);
    if options.mime {
        args.push(OsString::from("--mime"));
    }
    args.push(OsString::from("--separator"));
    args.push(OsString::from(separator.to_string()));
    args.push(path.as_os_str().to_os_string());

    debug!("args {:?} (separator {:?})", args, separator);

    Ok(FileArguments { args, separator })
}

fn contains_char(haystack: &OsStr, c: char) -> bool {
    let mut buf = [0u8; 4];
    let needle = c.encode_utf8(&mut buf).as_bytes();
    haystack
        .as_encoded_bytes()
        .windows(needle.len())
        .any(|window| window == needle)
}
