use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum PathError {
    #[error("Failed to get current directory: {source}")]
    #[diagnostic(code(filekit_utils::current_dir))]
    CurrentDir { source: std::io::Error },

    #[error("Path is empty")]
    #[diagnostic(code(filekit_utils::empty_path))]
    Empty,

    #[error("Environment variable `{var}` not set in `{input}`")]
    #[diagnostic(
        code(filekit_utils::missing_env_var),
        help("Export `{var}` or use an absolute path")
    )]
    MissingEnvVar { var: String, input: String },

    #[error("Unclosed variable expression starting at `{input}`")]
    #[diagnostic(code(filekit_utils::unclosed_variable))]
    UnclosedVariable { input: String },
}

#[derive(Error, Diagnostic, Debug)]
pub enum FileSystemError {
    #[error("Failed to {action} file `{}`: {source}", path.display())]
    #[diagnostic(
        code(filekit_utils::file),
        help("Check file permissions and disk space")
    )]
    File {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to {action} directory `{}`: {source}", path.display())]
    #[diagnostic(
        code(filekit_utils::directory),
        help("Check directory permissions")
    )]
    Directory {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("`{}` is not a directory", path.display())]
    #[diagnostic(code(filekit_utils::not_a_directory))]
    NotADirectory { path: PathBuf },
}

pub type FileSystemResult<T> = std::result::Result<T, FileSystemError>;
pub type PathResult<T> = std::result::Result<T, PathError>;

#[cfg(test)]
mod tests {
    use std::{error::Error, io};

    use super::*;

    #[test]
    fn test_path_error_display_and_source() {
        let current_dir_error = PathError::CurrentDir {
            source: io::Error::other("some error"),
        };
        assert_eq!(
            current_dir_error.to_string(),
            "Failed to get current directory: some error"
        );

        assert_eq!(PathError::Empty.to_string(), "Path is empty");
        assert!(PathError::Empty.source().is_none());

        let missing = PathError::MissingEnvVar {
            var: "VAR".to_string(),
            input: "$VAR".to_string(),
        };
        assert_eq!(
            missing.to_string(),
            "Environment variable `VAR` not set in `$VAR`"
        );

        let unclosed = PathError::UnclosedVariable {
            input: "${VAR".to_string(),
        };
        assert_eq!(
            unclosed.to_string(),
            "Unclosed variable expression starting at `${VAR`"
        );
    }

    #[test]
    fn test_file_system_error_display_and_source() {
        let file_error = FileSystemError::File {
            path: PathBuf::from("/file"),
            action: "remove",
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert_eq!(
            file_error.to_string(),
            "Failed to remove file `/file`: permission denied"
        );
        assert!(file_error.source().is_some());

        let dir_error = FileSystemError::Directory {
            path: PathBuf::from("/dir"),
            action: "create",
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert_eq!(
            dir_error.to_string(),
            "Failed to create directory `/dir`: permission denied"
        );
        assert!(dir_error.source().is_some());

        let not_a_dir = FileSystemError::NotADirectory {
            path: PathBuf::from("/path"),
        };
        assert_eq!(not_a_dir.to_string(), "`/path` is not a directory");
        assert!(not_a_dir.source().is_none());
    }
}
