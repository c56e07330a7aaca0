use documented::{Documented, DocumentedFields};
use serde::{Deserialize, Serialize};

/// An archive fetched and unpacked into the binaries directory when the detector has to be
/// provisioned.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct BinarySource {
    /// Short name used in logs and for the temporary archive name.
    pub name: String,

    /// URL of the zip archive. Redirects are followed.
    pub url: String,
}

impl BinarySource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

const WIN32_SOURCES: [(&str, &str); 3] = [
    (
        "file",
        "https://2.signageos.io/build/npm/file/file-5.03-bin-win32.zip",
    ),
    (
        "regex",
        "https://2.signageos.io/build/npm/regex/regex-2.7-bin-win32.zip",
    ),
    (
        "zlib",
        "https://2.signageos.io/build/npm/zlib/zlib-1.2.3-bin-win32.zip",
    ),
];

/// The win32 builds of `file` and the two libraries it links against.
pub fn default_win32_sources() -> Vec<BinarySource> {
    WIN32_SOURCES
        .iter()
        .map(|(name, url)| BinarySource::new(*name, *url))
        .collect()
}
