//! Image content loading
//!
//! Resolves an image reference into decoded RGB pixels. All branches
//! converge on RGB8 so downstream preprocessing never cares where the
//! pixels came from.

use image::{DynamicImage, RgbImage};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Timeout for remote image fetches
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// An image reference: local file, remote URL, or already-decoded pixels
#[derive(Debug, Clone)]
pub enum ImageSource {
    LocalPath(PathBuf),
    RemoteUrl(String),
    Decoded(DynamicImage),
}

impl ImageSource {
    /// Dispatch a string reference: http(s) scheme means remote, anything
    /// else is treated as a local filesystem path
    pub fn parse(reference: &str) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            ImageSource::RemoteUrl(reference.to_string())
        } else {
            ImageSource::LocalPath(PathBuf::from(reference))
        }
    }

    /// Resolve the reference into decoded RGB pixels
    pub fn load(&self) -> Result<RgbImage> {
        match self {
            ImageSource::RemoteUrl(url) => {
                let bytes = fetch_bytes(url)?;
                let decoded = image::load_from_memory(&bytes)
                    .map_err(|e| Error::ContentLoad(format!("failed to decode {url}: {e}")))?;
                Ok(decoded.to_rgb8())
            }
            ImageSource::LocalPath(path) => {
                let decoded = image::open(path).map_err(|e| {
                    Error::ContentLoad(format!("failed to open {}: {e}", path.display()))
                })?;
                Ok(decoded.to_rgb8())
            }
            ImageSource::Decoded(image) => Ok(image.to_rgb8()),
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::LocalPath(path) => write!(f, "{}", path.display()),
            ImageSource::RemoteUrl(url) => f.write_str(url),
            ImageSource::Decoded(image) => {
                write!(f, "<decoded {}x{} image>", image.width(), image.height())
            }
        }
    }
}

/// Fetch a remote resource.
///
/// The blocking reqwest client panics when driven from inside a tokio
/// runtime, so the request runs on a scoped thread.
fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| Error::ContentLoad(format!("failed to build HTTP client: {e}")))?;

    let response = std::thread::scope(|s| s.spawn(|| client.get(url).send()).join())
        .map_err(|_| Error::ContentLoad(format!("fetch thread panicked for {url}")))?
        .map_err(|e| Error::ContentLoad(format!("failed to fetch {url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::ContentLoad(format!(
            "failed to fetch {url}: HTTP {status}"
        )));
    }

    let bytes = response
        .bytes()
        .map_err(|e| Error::ContentLoad(format!("failed to read body of {url}: {e}")))?;
    Ok(bytes.to_vec())
}
