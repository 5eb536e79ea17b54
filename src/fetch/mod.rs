//! # Fetch Module
//!
//! Getting source images onto disk: web image search through a [`Provider`],
//! plain URL downloads and the random-location service.

pub mod crawler;
pub mod download;
pub mod location;
pub mod providers;

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::{
    error::{CompositorError, Result},
    paths::safe_dir_name,
};

pub use crawler::WebImageFetcher;
pub use download::{choose_extension, download_images};
pub use location::{Location, LocationClient, DEFAULT_LOCATION_ENDPOINT};
pub use providers::Provider;

/// Default number of images requested per query
pub const DEFAULT_MAX_IMAGES: usize = 30;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// One image search: what to look for and where the results go
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFetchRequest {
    pub query: String,
    pub output_dir: PathBuf,
    pub max_num: usize,
}

/// Anything that can populate a directory with images for a query
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Download images for the request and return every image now in `output_dir`
    async fn fetch(&self, request: &ImageFetchRequest) -> Result<Vec<PathBuf>>;
}

/// HTTP client shared by the fetchers
pub fn http_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| CompositorError::generic(format!("failed to build HTTP client: {}", e)))
}

/// Fetch images for `query` into `<output_base_dir>/<folder>`
///
/// The folder is `output_dir_name` when given, otherwise the query made safe for
/// the filesystem.
pub async fn fetch_images<F: ImageFetcher + ?Sized>(
    query: &str,
    output_base_dir: &Path,
    fetcher: &F,
    max_num: usize,
    output_dir_name: Option<&str>,
) -> Result<Vec<PathBuf>> {
    if query.trim().is_empty() {
        return Err(CompositorError::invalid_input("query must be a non-empty string"));
    }
    if max_num == 0 {
        return Err(CompositorError::invalid_input("max_num must be at least 1"));
    }

    let folder = match output_dir_name {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => safe_dir_name(query),
    };
    let request = ImageFetchRequest {
        query: query.to_string(),
        output_dir: output_base_dir.join(folder),
        max_num,
    };

    let images = fetcher.fetch(&request).await?;
    info!("{} images available in {:?}", images.len(), request.output_dir);
    Ok(images)
}
