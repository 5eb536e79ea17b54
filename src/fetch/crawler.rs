use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    fetch::{
        download::{fetch_bytes, sniff_image_extension},
        providers::Provider,
        ImageFetchRequest, ImageFetcher,
    },
    paths::list_image_files,
};

/// Result pages requested before giving up on reaching `max_num`
pub const MAX_SEARCH_PAGES: usize = 10;

/// Image fetcher backed by a web search engine
///
/// Scrapes the provider's result pages for full-size image URLs and downloads
/// them until the request's `max_num` images are saved. Payloads that do not
/// decode as a supported image format are dropped.
pub struct WebImageFetcher {
    provider: Provider,
    client: Client,
    endpoint: String,
    max_pages: usize,
}

impl WebImageFetcher {
    pub fn new(provider: Provider) -> Result<Self> {
        Ok(Self::with_client(provider, super::http_client()?))
    }

    pub fn with_client(provider: Provider, client: Client) -> Self {
        Self {
            provider,
            client,
            endpoint: provider.default_endpoint().to_string(),
            max_pages: MAX_SEARCH_PAGES,
        }
    }

    /// Query a different search endpoint (mirrors, test servers)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    async fn search_page(&self, query: &str, page: usize) -> Result<Vec<String>> {
        let url = self.provider.search_url(&self.endpoint, query, page)?;
        debug!("Searching {} page {}: {}", self.provider, page, url);
        let download = fetch_bytes(&self.client, url.as_str(), "text/html,application/json,*/*").await?;
        let body = String::from_utf8_lossy(&download.bytes);
        Ok(self.provider.parse_image_urls(&body))
    }
}

#[async_trait]
impl ImageFetcher for WebImageFetcher {
    async fn fetch(&self, request: &ImageFetchRequest) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&request.output_dir).await?;

        // Continue numbering after whatever the directory already holds
        let mut next_index = list_image_files(&request.output_dir)?.len() + 1;
        let mut seen = HashSet::new();
        let mut saved = 0usize;

        info!("🔍 Fetching up to {} images for '{}' from {}", request.max_num, request.query, self.provider);

        'pages: for page in 0..self.max_pages {
            let candidates = match self.search_page(&request.query, page).await {
                Ok(candidates) => candidates,
                // Nothing to show for this query yet: the search itself is broken
                Err(e) if saved == 0 && page == 0 => return Err(e),
                Err(e) => {
                    warn!("Stopping after page {} of '{}': {}", page, request.query, e);
                    break;
                }
            };
            let fresh: Vec<String> = candidates.into_iter().filter(|url| seen.insert(url.clone())).collect();
            if fresh.is_empty() {
                debug!("No new results on page {}", page);
                break;
            }

            for url in fresh {
                if saved >= request.max_num {
                    break 'pages;
                }

                let download = match fetch_bytes(&self.client, &url, "image/*").await {
                    Ok(download) => download,
                    Err(e) => {
                        warn!("Skipping {}: {}", url, e);
                        continue;
                    }
                };
                let Some(ext) = sniff_image_extension(&download.bytes) else {
                    warn!("Skipping {}: not a supported image", url);
                    continue;
                };

                let path = request.output_dir.join(format!("{:06}.{}", next_index, ext));
                tokio::fs::write(&path, &download.bytes).await?;
                debug!("Saved {:?}", path);
                next_index += 1;
                saved += 1;
            }

            if saved >= request.max_num {
                break;
            }
        }

        info!("   Downloaded {} images into {:?}", saved, request.output_dir);
        list_image_files(&request.output_dir)
    }
}
