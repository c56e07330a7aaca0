//! Error types for filekit-core.

use std::path::PathBuf;

use filekit_config::error::ConfigError;
use filekit_dl::error::DownloadError;
use filekit_utils::error::FileSystemError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum FileError {
    #[error(
        "File path is incorrect: {}. The separator cannot be determined from list: {}",
        path.display(),
        join_separators(attempted)
    )]
    #[diagnostic(
        code(filekit::separator_exhausted),
        help("Configure an alternative separator that does not occur in the path")
    )]
    SeparatorExhausted { path: PathBuf, attempted: Vec<char> },

    #[error("`{}` {}: {stderr}", binary.display(), describe_exit(*code))]
    #[diagnostic(
        code(filekit::process),
        help("Check that the `file` binary is installed and the path is readable")
    )]
    ProcessInvocationFailed {
        binary: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Unexpected output {output:?}: {reason}")]
    #[diagnostic(code(filekit::malformed_output))]
    MalformedOutput {
        output: String,
        reason: &'static str,
    },

    #[error("Provisioning the file binary failed: {0}")]
    #[diagnostic(
        code(filekit::provisioning),
        help("Restart the process to retry, or set `binary_path` to an existing binary")
    )]
    ProvisioningFailed(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Download(#[from] DownloadError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

fn join_separators(separators: &[char]) -> String {
    separators
        .iter()
        .map(char::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "could not be run".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_exhausted_message() {
        let err = FileError::SeparatorExhausted {
            path: PathBuf::from("/tmp/a:b;c"),
            attempted: vec![':', ';'],
        };
        assert_eq!(
            err.to_string(),
            "File path is incorrect: /tmp/a:b;c. The separator cannot be determined from list: :,;"
        );
    }

    #[test]
    fn test_process_invocation_failed_message() {
        let err = FileError::ProcessInvocationFailed {
            binary: PathBuf::from("file"),
            code: Some(1),
            stderr: "cannot open".to_string(),
        };
        assert_eq!(err.to_string(), "`file` exited with status 1: cannot open");

        let err = FileError::ProcessInvocationFailed {
            binary: PathBuf::from("file"),
            code: None,
            stderr: "No such file or directory".to_string(),
        };
        assert!(err.to_string().contains("could not be run"));
    }
}
