use std::{io, time::Duration};

use tracing::debug;
use ureq::{
    http::{header::LOCATION, Response},
    Agent, Body,
};
use url::Url;

use crate::{error::DownloadError, http_client::ClientConfig};

/// A single-attempt HTTP(S) GET client that follows redirects itself.
pub struct Http {
    agent: Agent,
    timeout: Option<Duration>,
    max_redirects: u32,
}

impl Http {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            agent: config.build(),
            timeout: config.timeout,
            max_redirects: config.max_redirects,
        }
    }

    /// Issues a GET for `url`, following 3xx responses until a final response arrives.
    ///
    /// Every `Location` header is resolved against the URL that produced it, so both
    /// absolute and relative redirects work. Any non-2xx final status becomes
    /// [`DownloadError::HttpError`].
    pub fn fetch(&self, url: &str) -> Result<Response<Body>, DownloadError> {
        let mut current = Url::parse(url).map_err(|source| {
            DownloadError::InvalidUrl {
                url: url.to_string(),
                source,
            }
        })?;

        for _ in 0..=self.max_redirects {
            let resp = self
                .agent
                .get(current.as_str())
                .call()
                .map_err(|err| self.classify(err, current.as_str()))?;

            let status = resp.status();

            if status.is_redirection() {
                let location = resp
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| {
                        DownloadError::MissingLocation {
                            status: status.as_u16(),
                            url: current.to_string(),
                        }
                    })?;

                let next = current.join(location).map_err(|source| {
                    DownloadError::InvalidUrl {
                        url: location.to_string(),
                        source,
                    }
                })?;

                debug!("{} redirected to {}", current, next);
                current = next;
                continue;
            }

            if !status.is_success() {
                return Err(DownloadError::HttpError {
                    status: status.as_u16(),
                    url: current.to_string(),
                });
            }

            return Ok(resp);
        }

        Err(DownloadError::TooManyRedirects {
            url: url.to_string(),
            limit: self.max_redirects,
        })
    }

    /// Maps an I/O error raised while streaming a response body.
    pub fn classify_io(&self, err: io::Error, url: &str) -> DownloadError {
        if err.kind() == io::ErrorKind::TimedOut {
            return self.timeout_error(url);
        }
        // body reads wrap the agent's own timeout in an `Other` io error
        if matches!(
            err.get_ref().and_then(|inner| inner.downcast_ref::<ureq::Error>()),
            Some(ureq::Error::Timeout(_))
        ) {
            return self.timeout_error(url);
        }
        DownloadError::Io(err)
    }

    fn classify(&self, err: ureq::Error, url: &str) -> DownloadError {
        match err {
            ureq::Error::Timeout(_) => self.timeout_error(url),
            ureq::Error::Io(io_err) => self.classify_io(io_err, url),
            other => DownloadError::from(other),
        }
    }

    fn timeout_error(&self, url: &str) -> DownloadError {
        DownloadError::Timeout {
            url: url.to_string(),
            timeout_ms: self
                .timeout
                .map(|timeout| u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX))
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Read, time::Instant};

    use super::*;
    use crate::test_utils::{Route, TestServer};

    fn client(timeout: Duration) -> Http {
        Http::new(&ClientConfig {
            timeout: Some(timeout),
            ..ClientConfig::default()
        })
    }

    fn body(resp: Response<Body>) -> Vec<u8> {
        let mut buf = Vec::new();
        resp.into_body().into_reader().read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_fetch_ok() {
        let server = TestServer::start(vec![("/file.zip", Route::ok(b"payload".to_vec()))]);

        let resp = client(Duration::from_secs(5))
            .fetch(&server.url("/file.zip"))
            .unwrap();
        assert_eq!(body(resp), b"payload");
    }

    #[test]
    fn test_fetch_follows_relative_redirect() {
        let server = TestServer::start(vec![
            ("/old.zip", Route::redirect(302, "/new/file.zip")),
            ("/new/file.zip", Route::ok(b"moved".to_vec())),
        ]);

        let resp = client(Duration::from_secs(5))
            .fetch(&server.url("/old.zip"))
            .unwrap();
        assert_eq!(body(resp), b"moved");
    }

    #[test]
    fn test_fetch_follows_chained_absolute_redirects() {
        let server = TestServer::start(vec![
            ("/a", Route::redirect(301, "/b")),
            ("/c", Route::ok(b"final".to_vec())),
        ]);
        let absolute = server.url("/c");
        server.add_route("/b", Route::redirect(302, &absolute));

        let resp = client(Duration::from_secs(5))
            .fetch(&server.url("/a"))
            .unwrap();
        assert_eq!(body(resp), b"final");
    }

    #[test]
    fn test_fetch_not_found() {
        let server = TestServer::start(vec![]);

        let err = client(Duration::from_secs(5))
            .fetch(&server.url("/missing.zip"))
            .unwrap_err();
        match err {
            DownloadError::HttpError { status, url } => {
                assert_eq!(status, 404);
                assert!(url.ends_with("/missing.zip"));
            }
            other => panic!("expected HttpError, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_redirect_loop() {
        let server = TestServer::start(vec![("/loop", Route::redirect(302, "/loop"))]);

        let http = Http::new(&ClientConfig {
            timeout: Some(Duration::from_secs(5)),
            max_redirects: 3,
            ..ClientConfig::default()
        });

        let err = http.fetch(&server.url("/loop")).unwrap_err();
        assert!(matches!(
            err,
            DownloadError::TooManyRedirects { limit: 3, .. }
        ));
    }

    #[test]
    fn test_fetch_timeout() {
        let server = TestServer::start(vec![("/slow.zip", Route::Hang)]);

        let started = Instant::now();
        let err = client(Duration::from_millis(300))
            .fetch(&server.url("/slow.zip"))
            .unwrap_err();

        assert!(matches!(
            err,
            DownloadError::Timeout {
                timeout_ms: 300,
                ..
            }
        ));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_body_stall_is_a_timeout() {
        let server = TestServer::start(vec![("/stall.zip", Route::stall(b"partial"))]);
        let http = client(Duration::from_millis(400));

        let resp = http.fetch(&server.url("/stall.zip")).unwrap();
        let mut buf = Vec::new();
        let err = resp
            .into_body()
            .into_reader()
            .read_to_end(&mut buf)
            .unwrap_err();

        assert!(matches!(
            http.classify_io(err, "http://example.test/stall.zip"),
            DownloadError::Timeout {
                timeout_ms: 400,
                ..
            }
        ));
    }

    #[test]
    fn test_timeout_ms_saturates() {
        let http = client(Duration::MAX);
        assert!(matches!(
            http.timeout_error("http://example.test/file.zip"),
            DownloadError::Timeout {
                timeout_ms: u64::MAX,
                ..
            }
        ));
    }

    #[test]
    fn test_fetch_invalid_url() {
        let err = client(Duration::from_secs(1))
            .fetch("not a url")
            .unwrap_err();
        assert!(matches!(err, DownloadError::InvalidUrl { .. }));
    }
}
