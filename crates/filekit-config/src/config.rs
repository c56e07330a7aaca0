use std::{
    collections::HashSet,
    fs,
    path::PathBuf,
    sync::{LazyLock, PoisonError, RwLock},
    time::Duration,
};

use documented::{Documented, DocumentedFields};
use filekit_utils::{
    fs::ensure_dir_exists,
    path::{resolve_path, xdg_config_home, xdg_data_home},
    time::parse_duration,
};
use serde::{Deserialize, Serialize};
use toml_edit::{DocumentMut, Item};
use tracing::{debug, info};
use url::Url;

use crate::{
    annotations::{annotate_toml_array_of_tables, annotate_toml_table},
    error::{ConfigError, Result},
    source::{default_win32_sources, BinarySource},
};

pub const DEFAULT_SEPARATOR: char = ':';
pub const DEFAULT_ALTERNATIVE_SEPARATORS: [char; 5] = [';', '$', '€', '>', '<'];
pub const DEFAULT_DOWNLOAD_TIMEOUT: &str = "30s";
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// filekit configuration
#[derive(Clone, Debug, Deserialize, Serialize, Documented, DocumentedFields)]
pub struct Config {
    /// Path to the `file` binary. A bare name is looked up on PATH.
    /// Default: `file`, or the provisioned binary on Windows
    pub binary_path: Option<String>,

    /// Report MIME type and charset instead of the textual description.
    /// Default: false
    pub mime: Option<bool>,

    /// Character passed to `--separator` between the path and its type.
    /// Default: ":"
    pub separator: Option<char>,

    /// Separators tried in order when the path already contains the separator.
    /// Default: [";", "$", "€", ">", "<"]
    pub alternative_separators: Option<Vec<char>>,

    /// Directory the win32 binaries are unpacked into.
    /// Default: $XDG_DATA_HOME/filekit/win32
    pub binaries_dir: Option<String>,

    /// Directory for temporary archive downloads.
    /// Default: the system temp directory
    pub temp_dir: Option<String>,

    /// Timeout for each archive download (e.g. "500ms", "30s", "2m").
    /// Default: "30s"
    pub download_timeout: Option<String>,

    /// Maximum number of redirects followed per download.
    /// Default: 10
    pub max_redirects: Option<u32>,

    /// Archives that make up the win32 distribution of `file`.
    #[serde(default = "default_win32_sources")]
    pub win32_sources: Vec<BinarySource>,
}

pub static CONFIG: LazyLock<RwLock<Option<Config>>> = LazyLock::new(|| RwLock::new(None));

pub static CONFIG_PATH: LazyLock<RwLock<PathBuf>> = LazyLock::new(|| {
    RwLock::new(match std::env::var("FILEKIT_CONFIG") {
        Ok(path_str) => PathBuf::from(path_str),
        Err(_) => xdg_config_home().join("filekit").join("config.toml"),
    })
});

/// Loads the configuration file into the global [`CONFIG`].
pub fn init() -> Result<()> {
    let config = Config::new()?;
    let mut global_config = CONFIG.write().unwrap_or_else(PoisonError::into_inner);
    *global_config = Some(config);
    Ok(())
}

/// Returns the loaded configuration, or the defaults if [`init`] was never called.
pub fn get_config() -> Config {
    if let Some(config) = CONFIG
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return config.clone();
    }

    CONFIG
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(Config::default_config)
        .clone()
}

pub fn config_path() -> PathBuf {
    CONFIG_PATH
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

pub fn set_config_path(path: PathBuf) {
    *CONFIG_PATH.write().unwrap_or_else(PoisonError::into_inner) = path;
}

fn default_binaries_dir() -> String {
    format!("{}/filekit/win32", xdg_data_home().display())
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            binary_path: None,
            mime: Some(false),
            separator: Some(DEFAULT_SEPARATOR),
            alternative_separators: Some(DEFAULT_ALTERNATIVE_SEPARATORS.to_vec()),
            binaries_dir: Some(default_binaries_dir()),
            temp_dir: None,
            download_timeout: Some(DEFAULT_DOWNLOAD_TIMEOUT.to_string()),
            max_redirects: Some(DEFAULT_MAX_REDIRECTS),
            win32_sources: default_win32_sources(),
        }
    }

    /// Creates a new configuration by loading it from the configuration file.
    /// If the configuration file is not found, it uses the default configuration.
    pub fn new() -> Result<Self> {
        let config_path = config_path();

        let mut config = match fs::read_to_string(&config_path) {
            Ok(content) => toml::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config at {}, using defaults", config_path.display());
                Self::default_config()
            }
            Err(err) => return Err(ConfigError::IoError(err)),
        };

        config.resolve()?;

        Ok(config)
    }

    /// Fills unset fields with their defaults and rejects values that cannot work.
    pub fn resolve(&mut self) -> Result<()> {
        let separator = *self.separator.get_or_insert(DEFAULT_SEPARATOR);
        validate_separator(separator)?;

        let alternatives = self
            .alternative_separators
            .get_or_insert_with(|| DEFAULT_ALTERNATIVE_SEPARATORS.to_vec());
        for &candidate in alternatives.iter() {
            validate_separator(candidate)?;
        }

        self.mime.get_or_insert(false);
        self.max_redirects.get_or_insert(DEFAULT_MAX_REDIRECTS);

        let timeout = self
            .download_timeout
            .get_or_insert_with(|| DEFAULT_DOWNLOAD_TIMEOUT.to_string());
        if parse_duration(timeout).is_none() {
            return Err(ConfigError::InvalidDuration(timeout.clone()));
        }

        if self.win32_sources.is_empty() {
            return Err(ConfigError::NoBinarySources);
        }

        let mut seen = HashSet::new();
        for source in &self.win32_sources {
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::DuplicateSourceName(source.name.clone()));
            }
            Url::parse(&source.url).map_err(|err| {
                ConfigError::InvalidSourceUrl {
                    name: source.name.clone(),
                    url: source.url.clone(),
                    source: err,
                }
            })?;
        }

        Ok(())
    }

    /// Binary override from `FILEKIT_BIN` or `binary_path`. Bare names are kept as-is so
    /// that they are looked up on PATH.
    pub fn get_binary_path(&self) -> Result<Option<PathBuf>> {
        let value = match std::env::var("FILEKIT_BIN") {
            Ok(env_path) => env_path,
            Err(_) => {
                match &self.binary_path {
                    Some(path) => path.clone(),
                    None => return Ok(None),
                }
            }
        };

        if value.contains(['/', '\\', '~', '$']) {
            Ok(Some(resolve_path(&value)?))
        } else {
            Ok(Some(PathBuf::from(value)))
        }
    }

    pub fn get_binaries_dir(&self) -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("FILEKIT_BINARIES_DIR") {
            return Ok(resolve_path(&env_path)?);
        }
        match &self.binaries_dir {
            Some(dir) => Ok(resolve_path(dir)?),
            None => Ok(resolve_path(&default_binaries_dir())?),
        }
    }

    pub fn get_temp_dir(&self) -> Result<PathBuf> {
        match &self.temp_dir {
            Some(dir) => Ok(resolve_path(dir)?),
            None => Ok(std::env::temp_dir()),
        }
    }

    pub fn get_download_timeout(&self) -> Duration {
        let millis = self
            .download_timeout
            .as_deref()
            .and_then(parse_duration)
            .unwrap_or(30_000);
        Duration::from_millis(millis)
    }

    pub fn get_max_redirects(&self) -> u32 {
        self.max_redirects.unwrap_or(DEFAULT_MAX_REDIRECTS)
    }

    pub fn get_separator(&self) -> char {
        self.separator.unwrap_or(DEFAULT_SEPARATOR)
    }

    pub fn get_alternative_separators(&self) -> Vec<char> {
        self.alternative_separators
            .clone()
            .unwrap_or_else(|| DEFAULT_ALTERNATIVE_SEPARATORS.to_vec())
    }

    pub fn is_mime(&self) -> bool {
        self.mime.unwrap_or(false)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = config_path();
        let serialized = toml::to_string_pretty(self)?;
        if let Some(parent) = config_path.parent() {
            ensure_dir_exists(parent)?;
        }
        fs::write(&config_path, serialized)?;
        info!("Configuration saved to {}", config_path.display());
        Ok(())
    }

    pub fn to_annotated_document(&self) -> Result<DocumentMut> {
        let toml_string = toml::to_string_pretty(self)?;
        let mut doc = toml_string.parse::<DocumentMut>()?;

        annotate_toml_table::<Config>(doc.as_table_mut(), true)?;

        if let Some(sources) = doc
            .get_mut("win32_sources")
            .and_then(Item::as_array_of_tables_mut)
        {
            annotate_toml_array_of_tables::<BinarySource>(sources)?;
        }

        Ok(doc)
    }
}

fn validate_separator(separator: char) -> Result<()> {
    if separator.is_whitespace() || separator.is_control() {
        return Err(ConfigError::InvalidSeparator(separator));
    }
    Ok(())
}

/// Writes the annotated default configuration to [`CONFIG_PATH`]. An existing file is
/// never overwritten.
pub fn generate_default_config() -> Result<()> {
    let config_path = config_path();

    if config_path.exists() {
        return Err(ConfigError::ConfigAlreadyExists);
    }

    let annotated_doc = Config::default_config().to_annotated_document()?;

    if let Some(parent) = config_path.parent() {
        ensure_dir_exists(parent)?;
    }

    fs::write(&config_path, annotated_doc.to_string())?;
    info!(
        "Default configuration file generated with documentation at: {}",
        config_path.display()
    );
    Ok(())
}
