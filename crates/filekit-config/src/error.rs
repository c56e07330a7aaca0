use filekit_utils::error::{FileSystemError, PathError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("TOML serialization error: {0}")]
    #[diagnostic(
        code(filekit_config::toml_serialize),
        help("Check your configuration structure for invalid values")
    )]
    TomlSerError(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    #[diagnostic(
        code(filekit_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError(#[from] toml::de::Error),

    #[error("Configuration file already exists")]
    #[diagnostic(
        code(filekit_config::already_exists),
        help("Remove the existing config file or use a different location")
    )]
    ConfigAlreadyExists,

    #[error("Invalid separator {0:?}")]
    #[diagnostic(
        code(filekit_config::invalid_separator),
        help("Separators must be visible, non-whitespace characters")
    )]
    InvalidSeparator(char),

    #[error("Invalid duration `{0}`")]
    #[diagnostic(
        code(filekit_config::invalid_duration),
        help("Use a number with a unit, e.g. `500ms`, `30s` or `2m`")
    )]
    InvalidDuration(String),

    #[error("Invalid binary source URL for `{name}`: {url}")]
    #[diagnostic(code(filekit_config::invalid_source_url))]
    InvalidSourceUrl {
        name: String,
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Duplicate binary source name: {0}")]
    #[diagnostic(
        code(filekit_config::duplicate_source),
        help("Each binary source must have a unique name")
    )]
    DuplicateSourceName(String),

    #[error("No binary sources configured")]
    #[diagnostic(
        code(filekit_config::no_sources),
        help("Remove `win32_sources` from your config to use the defaults")
    )]
    NoBinarySources,

    #[error("IO error: {0}")]
    #[diagnostic(code(filekit_config::io))]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error("Failed to parse TOML: {0}")]
    #[diagnostic(code(filekit_config::toml))]
    Toml(#[from] toml_edit::TomlError),

    #[error("Encountered unexpected TOML item: {0}")]
    #[diagnostic(code(filekit_config::unexpected_toml_item))]
    UnexpectedTomlItem(String),

    #[error("Failed to annotate first table in array: {0}")]
    #[diagnostic(code(filekit_config::annotate_first_table))]
    AnnotateFirstTable(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
