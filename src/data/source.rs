//! Where dataset bytes come from.
//!
//! A source only answers "what status and body did `{key}.json` produce?".
//! Status interpretation (404 handling, shape checks) lives in the loader so
//! that HTTP and on-disk datasets behave identically.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;

use crate::error::LoadError;

/// Dataset path prefix on the web host.
pub const DATASET_PREFIX: &str = "data/processed";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and body of one dataset fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: 404,
            body: String::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Fetches the raw payload for a dataset key.
///
/// Implementations must be shareable with a background fetch thread.
pub trait PanelSource: Send + Sync {
    fn fetch(&self, key: &str) -> Result<RawResponse, LoadError>;

    /// Human-readable location, for status lines and logs.
    fn describe(&self) -> String;
}

/// Dataset keys end up in URLs and file paths; keep them to `[a-z0-9_]+`.
pub fn validate_key(key: &str) -> Result<(), LoadError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(LoadError::InvalidKey { key: key.to_string() })
    }
}

/// `GET {base}/data/processed/{key}.json` over blocking HTTP.
pub struct HttpSource {
    client: Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, LoadError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| LoadError::Transport {
                message: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn dataset_url(&self, key: &str) -> String {
        format!("{}/{DATASET_PREFIX}/{key}.json", self.base_url)
    }
}

impl PanelSource for HttpSource {
    fn fetch(&self, key: &str) -> Result<RawResponse, LoadError> {
        validate_key(key)?;
        let url = self.dataset_url(key);
        tracing::debug!(%url, "fetching dataset");

        let resp = self.client.get(&url).send().map_err(|e| LoadError::Transport {
            message: format!("request to {url} failed: {e}"),
        })?;

        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| LoadError::Transport {
            message: format!("failed to read body from {url}: {e}"),
        })?;

        Ok(RawResponse { status, body })
    }

    fn describe(&self) -> String {
        format!("{}/{DATASET_PREFIX}", self.base_url)
    }
}

/// Reads `{dir}/{key}.json`. A missing file answers 404.
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dataset_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl PanelSource for DirSource {
    fn fetch(&self, key: &str) -> Result<RawResponse, LoadError> {
        validate_key(key)?;
        let path = self.dataset_path(key);
        tracing::debug!(path = %path.display(), "reading dataset");

        match std::fs::read_to_string(&path) {
            Ok(body) => Ok(RawResponse::ok(body)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RawResponse::not_found()),
            Err(e) => Err(LoadError::Transport {
                message: format!("failed to read '{}': {e}", path.display()),
            }),
        }
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}
