//! Where dataset payloads come from.
//!
//! The viewer talks to a [`DataSource`]: either the static asset server over
//! HTTP ([`HttpSource`]) or a local asset directory ([`DirectorySource`]).

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;

use crate::error::LoadError;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The three datasets the overlay needs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Trips,
    Stops,
    Meta,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Trips, Resource::Stops, Resource::Meta];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Trips => "trips",
            Resource::Stops => "stops",
            Resource::Meta => "meta",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Relative paths of each dataset under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub trips: String,
    pub stops: String,
    pub meta: String,
}

impl DataPaths {
    pub fn path(&self, resource: Resource) -> &str {
        match resource {
            Resource::Trips => &self.trips,
            Resource::Stops => &self.stops,
            Resource::Meta => &self.meta,
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            trips: "trips.json".to_string(),
            stops: "buses.json".to_string(),
            meta: "coord.json".to_string(),
        }
    }
}

/// Trait for dataset providers.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait DataSource: Send + Sync {
    /// Human-readable root, for logs.
    fn describe(&self) -> String;

    /// Raw bytes stored at `path`, relative to the source root.
    fn fetch<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Vec<u8>, LoadError>>;
}

/// Static files served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl DataSource for HttpSource {
    fn describe(&self) -> String {
        self.base_url.clone()
    }

    fn fetch<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Vec<u8>, LoadError>> {
        Box::pin(async move {
            let url = self.url_for(path);
            let resp = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| LoadError::transport(format!("GET {url}"), e))?;

            let status = resp.status();
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(LoadError::NotFound { location: url });
            }
            if !status.is_success() {
                return Err(LoadError::Status {
                    code: status.as_u16(),
                    location: url,
                });
            }

            let bytes = resp
                .bytes()
                .await
                .map_err(|e| LoadError::transport(format!("reading body of {url}"), e))?;
            Ok(bytes.to_vec())
        })
    }
}

/// Asset directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for DirectorySource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn fetch<'a>(&'a self, path: &'a str) -> BoxFuture<'a, Result<Vec<u8>, LoadError>> {
        Box::pin(async move {
            let full = self.root.join(path.trim_start_matches('/'));
            match tokio::fs::read(&full).await {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LoadError::NotFound {
                    location: full.display().to_string(),
                }),
                Err(e) => Err(LoadError::transport(
                    format!("reading {}", full.display()),
                    e,
                )),
            }
        })
    }
}

/// Picks the source type from a location: `http://` and `https://` URLs go
/// over the network, anything else is a directory.
pub fn open_source(location: &str) -> Arc<dyn DataSource> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Arc::new(HttpSource::new(location))
    } else {
        Arc::new(DirectorySource::new(location))
    }
}
