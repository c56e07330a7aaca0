use std::{
    fs::File,
    io::{BufWriter, Read as _, Write as _},
    path::{Path, PathBuf},
    time::Duration,
};

use tracing::debug;

use crate::{
    error::DownloadError,
    http::Http,
    http_client::{shared_client_config, ClientConfig},
};

pub struct Download {
    pub url: String,
    pub output: PathBuf,
    pub client: Option<ClientConfig>,
    pub timeout: Option<Duration>,
}

impl Download {
    /// Creates a new `Download` of `url` into `output`.
    ///
    /// Unless overridden with [`Download::client`], the process-wide client configuration
    /// is used.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use filekit_dl::download::Download;
    ///
    /// let bytes = Download::new("https://example.com/file-bin-win32.zip", "/tmp/file.zip")
    ///     .timeout(Duration::from_secs(30))
    ///     .execute()
    ///     .expect("download failed");
    /// println!("fetched {bytes} bytes");
    /// ```
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            output: output.into(),
            client: None,
            timeout: None,
        }
    }

    /// Uses `client` instead of the process-wide client configuration.
    pub fn client(mut self, client: ClientConfig) -> Self {
        self.client = Some(client);
        self
    }

    /// Overrides the request timeout for this download only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Performs the download and returns the number of bytes written.
    ///
    /// The output file is created (or truncated) only once a successful response has
    /// arrived. A single attempt is made; there is no retry or resume.
    pub fn execute(self) -> Result<u64, DownloadError> {
        let mut config = self.client.clone().unwrap_or_else(shared_client_config);
        if let Some(timeout) = self.timeout {
            config.timeout = Some(timeout);
        }

        let http = Http::new(&config);
        let resp = http.fetch(&self.url)?;

        debug!("downloading {} to {}", self.url, self.output.display());

        let file = File::create(&self.output)?;
        self.write_body(&http, resp.into_body().into_reader(), file, &self.output)
    }

    fn write_body(
        &self,
        http: &Http,
        mut reader: impl std::io::Read,
        file: File,
        path: &Path,
    ) -> Result<u64, DownloadError> {
        let mut writer = BufWriter::new(file);
        let mut buffer = [0u8; 8192];
        let mut downloaded = 0u64;

        loop {
            let n = reader
                .read(&mut buffer)
                .map_err(|err| http.classify_io(err, &self.url))?;
            if n == 0 {
                break;
            }

            writer.write_all(&buffer[..n])?;
            downloaded += n as u64;
        }

        writer.flush()?;
        debug!("wrote {} bytes to {}", downloaded, path.display());

        Ok(downloaded)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::test_utils::{Route, TestServer};

    fn config() -> ClientConfig {
        ClientConfig {
            timeout: Some(Duration::from_secs(5)),
            ..ClientConfig::default()
        }
    }

    #[test]
    fn test_download_to_file() {
        let payload: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
        let server = TestServer::start(vec![("/file.zip", Route::ok(payload.clone()))]);
        let dir = tempdir().unwrap();
        let output = dir.path().join("file.zip");

        let written = Download::new(server.url("/file.zip"), &output)
            .client(config())
            .execute()
            .unwrap();

        assert_eq!(written, payload.len() as u64);
        assert_eq!(fs::read(&output).unwrap(), payload);
    }

    #[test]
    fn test_download_overwrites_reserved_file() {
        let server = TestServer::start(vec![("/file.zip", Route::ok(b"new".to_vec()))]);
        let dir = tempdir().unwrap();
        let output = dir.path().join("file.zip");
        fs::write(&output, b"stale content that is longer").unwrap();

        Download::new(server.url("/file.zip"), &output)
            .client(config())
            .execute()
            .unwrap();

        assert_eq!(fs::read(&output).unwrap(), b"new");
    }

    #[test]
    fn test_download_error_does_not_create_output() {
        let server = TestServer::start(vec![("/gone.zip", Route::Status(410))]);
        let dir = tempdir().unwrap();
        let output = dir.path().join("gone.zip");

        let err = Download::new(server.url("/gone.zip"), &output)
            .client(config())
            .execute()
            .unwrap_err();

        assert!(matches!(err, DownloadError::HttpError { status: 410, .. }));
        assert!(!output.exists());
    }

    #[test]
    fn test_download_timeout_override() {
        let server = TestServer::start(vec![("/slow.zip", Route::Hang)]);
        let dir = tempdir().unwrap();

        let err = Download::new(server.url("/slow.zip"), dir.path().join("slow.zip"))
            .client(config())
            .timeout(Duration::from_millis(200))
            .execute()
            .unwrap_err();

        assert!(matches!(
            err,
            DownloadError::Timeout {
                timeout_ms: 200,
                ..
            }
        ));
    }

    #[test]
    fn test_download_body_stall_times_out() {
        let server = TestServer::start(vec![("/stall.zip", Route::stall(b"partial"))]);
        let dir = tempdir().unwrap();
        let url = server.url("/stall.zip");

        let started = std::time::Instant::now();
        let err = Download::new(&url, dir.path().join("stall.zip"))
            .client(config())
            .timeout(Duration::from_millis(400))
            .execute()
            .unwrap_err();

        match err {
            DownloadError::Timeout {
                url: failed,
                timeout_ms,
            } => {
                assert_eq!(failed, url);
                assert_eq!(timeout_ms, 400);
            }
            other => panic!("expected Timeout, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
