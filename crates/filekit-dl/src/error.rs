use std::path::PathBuf;

use filekit_utils::error::FileSystemError;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum DownloadError {
    #[error("Invalid URL: {url}")]
    #[diagnostic(code(filekit_dl::invalid_url))]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    #[diagnostic(
        code(filekit_dl::network),
        help("Check your internet connection or try again later")
    )]
    Network(#[from] Box<ureq::Error>),

    #[error("HTTP {status}: {url}")]
    #[diagnostic(code(filekit_dl::http_error))]
    HttpError { status: u16, url: String },

    #[error("Download timeout for {url} ({timeout_ms}ms)")]
    #[diagnostic(
        code(filekit_dl::timeout),
        help("Increase `download_timeout` in the config or check the mirror")
    )]
    Timeout { url: String, timeout_ms: u64 },

    #[error("Too many redirects (limit {limit}) starting at {url}")]
    #[diagnostic(code(filekit_dl::too_many_redirects))]
    TooManyRedirects { url: String, limit: u32 },

    #[error("HTTP {status} redirect without a Location header: {url}")]
    #[diagnostic(code(filekit_dl::missing_location))]
    MissingLocation { status: u16, url: String },

    #[error(transparent)]
    #[diagnostic(code(filekit_dl::io))]
    Io(#[from] std::io::Error),

    #[error("Failed to extract `{}`", archive.display())]
    #[diagnostic(
        code(filekit_dl::extraction_failed),
        help("The archive may be corrupted or the target directory not writable")
    )]
    ExtractionFailed {
        archive: PathBuf,
        #[source]
        source: ExtractError,
    },
}

/// Reasons a single archive could not be unpacked.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error("Entry `{0}` escapes the extraction directory")]
    UnsafePath(String),
}

impl From<ureq::Error> for DownloadError {
    fn from(e: ureq::Error) -> Self {
        Self::Network(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_invalid_url() {
        let err = DownloadError::InvalidUrl {
            url: "invalid".to_string(),
            source: url::ParseError::RelativeUrlWithoutBase,
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Invalid URL"));
        assert!(msg.contains("invalid"));
    }

    #[test]
    fn test_download_error_http_error() {
        let err = DownloadError::HttpError {
            status: 404,
            url: "https://example.com/notfound".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("HTTP 404"));
        assert!(msg.contains("https://example.com/notfound"));
    }

    #[test]
    fn test_download_error_timeout() {
        let err = DownloadError::Timeout {
            url: "http://127.0.0.1/file.zip".to_string(),
            timeout_ms: 30000,
        };
        assert_eq!(
            err.to_string(),
            "Download timeout for http://127.0.0.1/file.zip (30000ms)"
        );
    }

    #[test]
    fn test_download_error_extraction_source_chain() {
        let err = DownloadError::ExtractionFailed {
            archive: PathBuf::from("/tmp/file.zip"),
            source: ExtractError::UnsafePath("../evil".to_string()),
        };
        assert_eq!(err.to_string(), "Failed to extract `/tmp/file.zip`");

        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(
            source.to_string(),
            "Entry `../evil` escapes the extraction directory"
        );
    }

    #[test]
    fn test_from_ureq_error() {
        let download_err: DownloadError = ureq::Error::ConnectionFailed.into();
        assert!(matches!(download_err, DownloadError::Network(_)));
    }
}
