//! Running the detector and turning its output into a [`DetectionResult`].

use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
    process::Command,
    sync::LazyLock,
};

use filekit_config::config::get_config;
use regex::Regex;
use tracing::debug;

use crate::{
    args::{build_arguments, FileArguments},
    error::FileError,
    options::DetectionOptions,
    parse::{parse_output, DetectionResult},
    provision::{provisioned_binary, Provisioner},
    FileResult,
};

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^file-(\d+)\.(\d+)").expect("unable to compile file version regex")
});

/// Detects the type of the file at `path`.
///
/// Arguments are built before the binary is resolved, so a path that rules out every
/// separator fails without provisioning anything. A non-zero exit status is reported
/// as [`FileError::ProcessInvocationFailed`] and its output is never parsed.
pub fn detect(path: impl AsRef<Path>, options: &DetectionOptions) -> FileResult<DetectionResult> {
    let FileArguments { args, separator } = build_arguments(path.as_ref(), options)?;

    let binary = resolve_binary(options)?;
    debug!("bin {}", binary.display());

    let stdout = run(&binary, &args)?;

    parse_output(&stdout, separator, options.mime)
}

/// Returns the first line of `file --version`, e.g. `file-5.41`.
pub fn version(options: &DetectionOptions) -> FileResult<String> {
    let binary = resolve_binary(options)?;
    let stdout = run(&binary, &[OsString::from("--version")])?;

    let first_line = stdout.lines().next().unwrap_or_default().trim();
    if first_line.is_empty() {
        return Err(FileError::MalformedOutput {
            output: stdout.clone(),
            reason: "empty version output",
        });
    }

    Ok(first_line.to_string())
}

/// Version number from a `file-<major>.<minor>` banner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FileVersion {
    pub major: u32,
    pub minor: u32,
}

impl FileVersion {
    pub fn parse(version: impl AsRef<str>) -> Option<Self> {
        let caps = VERSION_RE.captures(version.as_ref().trim())?;
        Some(Self {
            major: caps[1].parse().ok()?,
            minor: caps[2].parse().ok()?,
        })
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Picks the binary to run: the explicit override, the provisioned win32 build on
/// Windows, or `file` from PATH.
pub fn resolve_binary(options: &DetectionOptions) -> FileResult<PathBuf> {
    if let Some(binary) = &options.binary_path {
        return Ok(binary.clone());
    }

    if cfg!(windows) {
        let provisioner = Provisioner::from_config(&get_config())?;
        return provisioned_binary(&provisioner);
    }

    Ok(PathBuf::from("file"))
}

fn run(binary: &Path, args: &[OsString]) -> FileResult<String> {
    let output = Command::new(binary).args(args).output().map_err(|err| {
        FileError::ProcessInvocationFailed {
            binary: binary.to_path_buf(),
            code: None,
            stderr: err.to_string(),
        }
    })?;

    if !output.status.success() {
        return Err(FileError::ProcessInvocationFailed {
            binary: binary.to_path_buf(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    debug!("raw result {:?}", stdout);
    Ok(stdout)
}
