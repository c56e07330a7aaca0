//! Fetching and unpacking the win32 build of `file`.

use std::{
    env,
    io,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{Condvar, LazyLock, Mutex, MutexGuard, PoisonError},
    thread,
};

use filekit_config::{
    config::Config,
    source::{default_win32_sources, BinarySource},
};
use filekit_dl::{
    download::Download,
    error::DownloadError,
    extract::extract_zip,
    http_client::{shared_client_config, ClientConfig},
};
use filekit_utils::fs::{ensure_dir_exists, remove_file, reserve_temp_file, RemoveOutcome};
use tracing::{debug, info, warn};

use crate::{error::FileError, FileResult};

/// Location of the detector binary inside a provisioned directory.
pub const BINARY_MARKER: &str = "bin/file.exe";

/// One archive of a provisioning run.
#[derive(Clone, Debug)]
pub struct ProvisioningArtifact {
    pub name: String,
    pub source_url: String,
    pub temporary_local_path: PathBuf,
    pub extraction_target: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProvisionOutcome {
    AlreadyPresent,
    Provisioned,
}

/// Installs the detector and the libraries it links against into a target directory.
#[derive(Clone, Debug)]
pub struct Provisioner {
    sources: Vec<BinarySource>,
    target_dir: PathBuf,
    temp_dir: PathBuf,
    marker: PathBuf,
    client: ClientConfig,
}

impl Provisioner {
    /// A provisioner for the default win32 archives, downloading through the process-wide
    /// HTTP client configuration into the system temp directory.
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            sources: default_win32_sources(),
            target_dir: target_dir.into(),
            temp_dir: env::temp_dir(),
            marker: PathBuf::from(BINARY_MARKER),
            client: shared_client_config(),
        }
    }

    pub fn from_config(config: &Config) -> FileResult<Self> {
        let mut client = shared_client_config();
        client.timeout = Some(config.get_download_timeout());
        client.max_redirects = config.get_max_redirects();

        Ok(Self::new(config.get_binaries_dir()?)
            .sources(config.win32_sources.clone())
            .temp_dir(config.get_temp_dir()?)
            .client(client))
    }

    pub fn sources(mut self, sources: Vec<BinarySource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn marker(mut self, marker: impl Into<PathBuf>) -> Self {
        self.marker = marker.into();
        self
    }

    pub fn client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Path of the detector once provisioned.
    pub fn binary_path(&self) -> PathBuf {
        self.target_dir.join(&self.marker)
    }

    pub fn is_provisioned(&self) -> bool {
        self.binary_path().is_file()
    }

    /// Makes sure the detector is present, downloading it if needed.
    ///
    /// Nothing touches the network when the binary already exists. Otherwise all archives
    /// are downloaded concurrently, then extracted one after another into the target
    /// directory. Temporary archives are removed whether or not this succeeds.
    ///
    /// # Errors
    ///
    /// The first download or extraction error, in source order.
    pub fn ensure_provisioned(&self) -> FileResult<ProvisionOutcome> {
        if self.is_provisioned() {
            debug!("{} already present", self.binary_path().display());
            return Ok(ProvisionOutcome::AlreadyPresent);
        }

        info!("Provisioning file binaries into {}", self.target_dir.display());

        let artifacts = self.reserve_artifacts()?;
        let result = self.fetch_and_extract(&artifacts);
        cleanup(&artifacts);
        result?;

        info!("Provisioned {}", self.binary_path().display());
        Ok(ProvisionOutcome::Provisioned)
    }

    fn reserve_artifacts(&self) -> FileResult<Vec<ProvisioningArtifact>> {
        let mut artifacts = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            let prefix = format!("filekit-{}-", source.name);
            match reserve_temp_file(&self.temp_dir, &prefix, ".zip") {
                Ok(path) => {
                    artifacts.push(ProvisioningArtifact {
                        name: source.name.clone(),
                        source_url: source.url.clone(),
                        temporary_local_path: path,
                        extraction_target: self.target_dir.clone(),
                    });
                }
                Err(err) => {
                    cleanup(&artifacts);
                    return Err(err.into());
                }
            }
        }

        Ok(artifacts)
    }

    fn fetch_and_extract(&self, artifacts: &[ProvisioningArtifact]) -> FileResult<()> {
        let results: Vec<Result<u64, DownloadError>> = thread::scope(|scope| {
            let handles: Vec<_> = artifacts
                .iter()
                .map(|artifact| scope.spawn(move || self.fetch(artifact)))
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|_| {
                        Err(DownloadError::Io(io::Error::other("download thread panicked")))
                    })
                })
                .collect()
        });

        for result in results {
            result?;
        }

        ensure_dir_exists(&self.target_dir)?;

        for artifact in artifacts {
            let entries = extract_zip(
                &artifact.temporary_local_path,
                &artifact.extraction_target,
            )?;
            debug!("extracted {} entries from {}", entries.len(), artifact.name);
        }

        Ok(())
    }

    fn fetch(&self, artifact: &ProvisioningArtifact) -> Result<u64, DownloadError> {
        debug!(
            "fetching {} from {} into {}",
            artifact.name,
            artifact.source_url,
            artifact.temporary_local_path.display()
        );
        Download::new(&artifact.source_url, &artifact.temporary_local_path)
            .client(self.client.clone())
            .execute()
    }
}

fn cleanup(artifacts: &[ProvisioningArtifact]) {
    for artifact in artifacts {
        let path = &artifact.temporary_local_path;
        match remove_file(path) {
            Ok(RemoveOutcome::Removed) => debug!("removed {}", path.display()),
            Ok(RemoveOutcome::NotFound) => {}
            Err(err) => warn!("Failed to remove temporary archive: {}", err),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProvisionState {
    NotStarted,
    InProgress,
    Done,
    Failed(String),
}

/// Runs provisioning at most once and makes every other caller wait for it.
///
/// A failed run is remembered; later callers get [`FileError::ProvisioningFailed`]
/// without another attempt.
pub struct ProvisionGate {
    state: Mutex<ProvisionState>,
    ready: Condvar,
}

impl Default for ProvisionGate {
    fn default() -> Self {
        Self {
            state: Mutex::new(ProvisionState::NotStarted),
            ready: Condvar::new(),
        }
    }
}

impl ProvisionGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ProvisionState {
        self.lock().clone()
    }

    /// Runs `provision` if nobody has yet, otherwise waits for the run in progress.
    ///
    /// The caller that runs `provision` gets its error unchanged.
    pub fn ensure<F>(&self, provision: F) -> FileResult<()>
    where
        F: FnOnce() -> FileResult<()>,
    {
        let mut state = self.lock();
        loop {
            match &*state {
                ProvisionState::NotStarted => break,
                ProvisionState::InProgress => {
                    state = self
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                ProvisionState::Done => return Ok(()),
                ProvisionState::Failed(message) => {
                    return Err(FileError::ProvisioningFailed(message.clone()));
                }
            }
        }
        *state = ProvisionState::InProgress;
        drop(state);

        let result = panic::catch_unwind(AssertUnwindSafe(provision)).unwrap_or_else(|_| {
            Err(FileError::ProvisioningFailed(
                "provisioning panicked".to_string(),
            ))
        });

        let mut state = self.lock();
        *state = match &result {
            Ok(()) => ProvisionState::Done,
            Err(err) => ProvisionState::Failed(err.to_string()),
        };
        self.ready.notify_all();

        result
    }

    fn lock(&self) -> MutexGuard<'_, ProvisionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub static PROVISION_GATE: LazyLock<ProvisionGate> = LazyLock::new(ProvisionGate::default);

/// Provisions through the process-wide gate and returns the detector path.
pub fn provisioned_binary(provisioner: &Provisioner) -> FileResult<PathBuf> {
    PROVISION_GATE.ensure(|| provisioner.ensure_provisioned().map(|_| ()))?;
    Ok(provisioner.binary_path())
}
