use std::path::{Path, PathBuf};

use image::ImageFormat;
use reqwest::{header, Client};
use tracing::{debug, warn};

use crate::{
    error::{FetchError, Result},
    paths::SUPPORTED_IMAGE_EXTENSIONS,
};

/// Downloaded body plus the server's declared content type
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// GET `url` and return the body, failing on transport errors and non-2xx statuses
pub async fn fetch_bytes(client: &Client, url: &str, accept: &str) -> Result<Download> {
    let response = client
        .get(url)
        .header(header::ACCEPT, accept)
        .send()
        .await
        .map_err(|source| FetchError::Request { url: url.to_string(), source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::HttpStatus { url: url.to_string(), status: status.as_u16() }.into());
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let bytes = response
        .bytes()
        .await
        .map_err(|source| FetchError::Request { url: url.to_string(), source })?;

    Ok(Download { bytes: bytes.to_vec(), content_type })
}

/// File extension (with dot) for a downloaded image
///
/// The URL path wins when it already names a supported image type, then the
/// content type, then `.jpg`.
pub fn choose_extension(url: &str, content_type: Option<&str>) -> String {
    let from_path = url::Url::parse(url).ok().and_then(|parsed| {
        Path::new(parsed.path())
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
    });
    if let Some(ext) = from_path {
        if SUPPORTED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            return format!(".{}", ext);
        }
    }

    let content_type = content_type.unwrap_or_default().to_lowercase();
    let ext = if content_type.contains("png") {
        "png"
    } else if content_type.contains("webp") {
        "webp"
    } else if content_type.contains("bmp") {
        "bmp"
    } else if content_type.contains("tiff") {
        "tiff"
    } else {
        "jpg"
    };
    format!(".{}", ext)
}

/// Extension for payloads whose bytes decode as a supported image format
pub fn sniff_image_extension(bytes: &[u8]) -> Option<&'static str> {
    match image::guess_format(bytes).ok()? {
        ImageFormat::Jpeg => Some("jpg"),
        ImageFormat::Png => Some("png"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Bmp => Some("bmp"),
        ImageFormat::Tiff => Some("tiff"),
        _ => None,
    }
}

/// Download `urls` into `dir` as `001.<ext>`, `002.<ext>`, ...
///
/// The number is the URL's position in the list, so skipped entries leave gaps.
/// Empty URLs and failed downloads are skipped with a warning.
pub async fn download_images(client: &Client, urls: &[String], dir: &Path) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;

    let mut downloaded = Vec::new();
    for (index, url) in urls.iter().enumerate() {
        if url.trim().is_empty() {
            continue;
        }

        let download = match fetch_bytes(client, url, "image/*").await {
            Ok(download) => download,
            Err(e) => {
                warn!("Failed to download {}: {}", url, e);
                continue;
            }
        };

        let ext = choose_extension(url, download.content_type.as_deref());
        let path = dir.join(format!("{:03}{}", index + 1, ext));
        tokio::fs::write(&path, &download.bytes).await?;
        debug!("Saved {} -> {:?}", url, path);
        downloaded.push(path);
    }

    Ok(downloaded)
}
