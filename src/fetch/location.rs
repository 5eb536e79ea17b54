use std::path::{Path, PathBuf};

use reqwest::{header, Client};
use serde_json::Value;
use tracing::info;
use url::Url;

use crate::{
    error::{FetchError, Result},
    fetch::download::download_images,
    paths::{safe_dir_name, VIDEO_EXTENSION},
};

pub const DEFAULT_LOCATION_ENDPOINT: &str = "api/v1/social-media/location/random";

/// A place returned by the location service
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    /// Entries that are not strings are kept as empty slots so numbering follows the payload
    pub image_urls: Vec<String>,
}

impl Location {
    /// Parse the service's JSON body: an object with `name` and `imageUrls`
    pub fn from_json(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body).map_err(|e| FetchError::MalformedPayload {
            reason: format!("response is not JSON: {}", e),
        })?;
        let object = value.as_object().ok_or_else(|| FetchError::MalformedPayload {
            reason: "expected a JSON object".to_string(),
        })?;

        let name = object
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let urls = object.get("imageUrls").and_then(Value::as_array);

        match (name, urls) {
            (Some(name), Some(urls)) => Ok(Self {
                name: name.to_string(),
                image_urls: urls
                    .iter()
                    .map(|url| url.as_str().unwrap_or_default().to_string())
                    .collect(),
            }),
            _ => Err(FetchError::MalformedPayload {
                reason: "response is missing name or imageUrls".to_string(),
            }
            .into()),
        }
    }

    pub fn dir_name(&self) -> String {
        safe_dir_name(&self.name)
    }

    /// Where the slideshow for this location is written
    pub fn render_path(&self, renders_dir: &Path) -> PathBuf {
        renders_dir.join(format!("{}.{}", self.dir_name(), VIDEO_EXTENSION))
    }
}

/// Client for the random-location endpoint of the content server
#[derive(Debug, Clone)]
pub struct LocationClient {
    base_url: String,
    client: Client,
}

impl LocationClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self::with_client(base_url, super::http_client()?))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self { base_url: base_url.into(), client }
    }

    /// Join `endpoint` onto `base_url` as a path below it
    pub fn build_url(base_url: &str, endpoint: &str) -> Result<Url> {
        let base = format!("{}/", base_url.trim_end_matches('/'));
        Url::parse(&base)
            .and_then(|base| base.join(endpoint.trim_start_matches('/')))
            .map_err(|_| FetchError::InvalidUrl { url: format!("{}{}", base, endpoint) }.into())
    }

    pub async fn fetch_random(&self, endpoint: &str) -> Result<Location> {
        let url = Self::build_url(&self.base_url, endpoint)?;
        info!("📍 Requesting random location from {}", url);

        let response = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|source| FetchError::Request { url: url.to_string(), source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus { url: url.to_string(), status: status.as_u16() }.into());
        }

        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Request { url: url.to_string(), source })?;
        Location::from_json(&body)
    }

    /// Download a location's images into `<images_base>/<safe name>`
    ///
    /// Fails with [`FetchError::NoImagesDownloaded`] when none of the URLs produced a file.
    pub async fn download(&self, location: &Location, images_base: &Path) -> Result<Vec<PathBuf>> {
        let dir = images_base.join(location.dir_name());
        let images = download_images(&self.client, &location.image_urls, &dir).await?;
        if images.is_empty() {
            return Err(FetchError::NoImagesDownloaded { query: location.name.clone() }.into());
        }
        info!("   Saved {} images to {:?}", images.len(), dir);
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CompositorError, ErrorKind};
    use tempfile::tempdir;
    use wiremock::matchers::{header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_build_url() {
        let url = LocationClient::build_url("https://api.example.com/", "/api/v1/x").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/x");

        let url = LocationClient::build_url("https://api.example.com/prefix", "api/v1/x").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/prefix/api/v1/x");

        assert!(LocationClient::build_url("not a url", "x").is_err());
    }

    #[test]
    fn test_location_parsing() {
        let location =
            Location::from_json(r#"{"name":"Lake Bled","imageUrls":["https://a/1.jpg",7,""]}"#).unwrap();
        assert_eq!(location.name, "Lake Bled");
        assert_eq!(location.image_urls, vec!["https://a/1.jpg", "", ""]);
        assert_eq!(location.dir_name(), "Lake-Bled");
        assert_eq!(
            location.render_path(Path::new("outputs/renders")),
            PathBuf::from("outputs/renders/Lake-Bled.mp4")
        );
    }

    #[test]
    fn test_malformed_payloads() {
        for body in ["plain text", "[1,2]", r#"{"name":"x"}"#, r#"{"name":"","imageUrls":[]}"#, r#"{"name":"x","imageUrls":"a"}"#] {
            let err = Location::from_json(body).unwrap_err();
            assert!(
                matches!(err, CompositorError::Fetch(FetchError::MalformedPayload { .. })),
                "{} -> {:?}",
                body,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_random_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/social-media/location/random"))
            .and(header_matcher("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"name":"Hallstatt","imageUrls":["https://img/1.jpg"]}"#,
            ))
            .mount(&server)
            .await;

        let client = LocationClient::with_client(server.uri(), Client::new());
        let location = client.fetch_random(DEFAULT_LOCATION_ENDPOINT).await.unwrap();
        assert_eq!(location.name, "Hallstatt");
        assert_eq!(location.image_urls.len(), 1);
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = LocationClient::with_client(server.uri(), Client::new());
        let err = client.fetch_random(DEFAULT_LOCATION_ENDPOINT).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExternalCall);
        assert!(matches!(err, CompositorError::Fetch(FetchError::HttpStatus { status: 404, .. })));
    }

    #[tokio::test]
    async fn test_download_with_no_images_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let client = LocationClient::with_client(server.uri(), Client::new());
        let location = Location {
            name: "Nowhere".into(),
            image_urls: vec![format!("{}/1.jpg", server.uri()), String::new()],
        };

        let err = client.download(&location, dir.path()).await.unwrap_err();
        assert!(matches!(err, CompositorError::Fetch(FetchError::NoImagesDownloaded { .. })));
    }
}
