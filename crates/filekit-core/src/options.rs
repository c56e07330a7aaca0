use std::path::PathBuf;

use filekit_config::config::{Config, DEFAULT_ALTERNATIVE_SEPARATORS, DEFAULT_SEPARATOR};

use crate::FileResult;

/// Options for a single detection call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetectionOptions {
    /// Detector binary to run instead of the platform default.
    pub binary_path: Option<PathBuf>,
    /// Ask for `type/subtype; charset=...` instead of the textual description.
    pub mime: bool,
    pub separator: char,
    pub alternative_separators: Vec<char>,
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self {
            binary_path: None,
            mime: false,
            separator: DEFAULT_SEPARATOR,
            alternative_separators: DEFAULT_ALTERNATIVE_SEPARATORS.to_vec(),
        }
    }
}

impl DetectionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from the user configuration, including the `FILEKIT_BIN` override.
    pub fn from_config(config: &Config) -> FileResult<Self> {
        Ok(Self {
            binary_path: config.get_binary_path()?,
            mime: config.is_mime(),
            separator: config.get_separator(),
            alternative_separators: config.get_alternative_separators(),
        })
    }

    pub fn binary_path(mut self, binary_path: impl Into<PathBuf>) -> Self {
        self.binary_path = Some(binary_path.into());
        self
    }

    pub fn mime(mut self, mime: bool) -> Self {
        self.mime = mime;
        self
    }

    pub fn separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn alternative_separators(mut self, separators: impl IntoIterator<Item = char>) -> Self {
        self.alternative_separators = separators.into_iter().collect();
        self
    }

    /// The separator followed by its alternatives, each character at most once.
    pub fn candidates(&self) -> Vec<char> {
        let mut candidates = Vec::with_capacity(self.alternative_separators.len() + 1);
        for c in std::iter::once(self.separator).chain(self.alternative_separators.iter().copied())
        {
            if !candidates.contains(&c) {
                candidates.push(c);
            }
        }
        candidates
    }
}
