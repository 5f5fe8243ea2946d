//! OpenAI image generation (gpt-image-1) with save-to-disk.

use crate::error::{truncate_body, BrandGenError, FailureReason, Result};
use crate::image::provider::ImageProvider;
use crate::image::types::{
    GenerationFailure, GenerationRequest, GenerationResult, ImageFormat, PayloadSource,
    SavedImage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const GENERATIONS_URL: &str = "https://api.openai.com/v1/images/generations";
const DEFAULT_MODEL: &str = "gpt-image-1";

/// Environment variable the API key is read from.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Builder for [`ImageFetcher`].
#[derive(Clone)]
pub struct ImageFetcherBuilder {
    api_key: Option<String>,
    endpoint: String,
    model: String,
    request_timeout: Duration,
    download_timeout: Duration,
}

impl Default for ImageFetcherBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: GENERATIONS_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(60),
            download_timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for ImageFetcherBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFetcherBuilder")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("request_timeout", &self.request_timeout)
            .field("download_timeout", &self.download_timeout)
            .finish()
    }
}

impl ImageFetcherBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `OPENAI_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Overrides the generations endpoint URL.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Sets the model identifier sent with each request.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Timeout for the generation request (default 60s).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Timeout for downloading a URL-based result (default 30s).
    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Builds the fetcher, resolving the API key.
    pub fn build(self) -> Result<ImageFetcher> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .or_else(|| {
                std::env::var(API_KEY_ENV)
                    .ok()
                    .filter(|key| !key.trim().is_empty())
            })
            .ok_or_else(|| {
                BrandGenError::Config(format!("{API_KEY_ENV} not set and no API key provided"))
            })?;

        Ok(ImageFetcher {
            client: reqwest::Client::new(),
            api_key,
            endpoint: self.endpoint,
            model: self.model,
            request_timeout: self.request_timeout,
            download_timeout: self.download_timeout,
        })
    }
}

/// Generates images through the OpenAI images endpoint and writes them to disk.
///
/// The fetcher holds no per-call state; the same instance can serve any
/// number of sequential requests.
pub struct ImageFetcher {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    request_timeout: Duration,
    download_timeout: Duration,
}

impl ImageFetcher {
    /// Creates a new `ImageFetcherBuilder`.
    pub fn builder() -> ImageFetcherBuilder {
        ImageFetcherBuilder::new()
    }

    /// Returns the model identifier in use.
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn acquire(&self, request: &GenerationRequest) -> Result<(PayloadSource, Vec<u8>)> {
        let body = ImagesRequest::from_generation_request(request, &self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.request_timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BrandGenError::Api {
                status: status.as_u16(),
                message: truncate_body(&text),
            });
        }

        let raw = response.bytes().await?;
        let parsed: ImagesResponse = serde_json::from_slice(&raw)?;

        match ImagePayload::from_response(parsed) {
            ImagePayload::Inline(b64) => {
                use base64::Engine;
                let data = base64::engine::general_purpose::STANDARD
                    .decode(b64.trim())
                    .map_err(|e| BrandGenError::Decode(e.to_string()))?;
                Ok((PayloadSource::Inline, data))
            }
            ImagePayload::Remote(url) => {
                tracing::debug!(url = %url, "downloading generated image");
                Ok((PayloadSource::Remote, self.download(&url).await?))
            }
            ImagePayload::Malformed(reason) => {
                Err(BrandGenError::UnexpectedResponse(reason.into()))
            }
        }
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BrandGenError::Download {
                status: status.as_u16(),
                message: truncate_body(&text),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_and_save(&self, request: &GenerationRequest) -> Result<SavedImage> {
        let start = Instant::now();
        let (source, data) = self.acquire(request).await?;
        write_image(request.output(), &data).await?;

        Ok(SavedImage {
            path: request.output().to_path_buf(),
            size_bytes: data.len(),
            format: ImageFormat::from_magic_bytes(&data),
            source,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl ImageProvider for ImageFetcher {
    async fn fetch(&self, request: &GenerationRequest) -> GenerationResult {
        tracing::debug!(
            output = %request.output().display(),
            size = %request.size(),
            quality = %request.quality(),
            "requesting image"
        );

        match self.fetch_and_save(request).await {
            Ok(saved) => {
                tracing::debug!(
                    path = %saved.path.display(),
                    bytes = saved.size_bytes,
                    duration_ms = saved.duration_ms,
                    "image saved"
                );
                GenerationResult::Success(saved)
            }
            Err(e) => {
                // Config and InvalidRequest cannot arise past build().
                let reason = e.reason().unwrap_or(FailureReason::MalformedResponse);
                tracing::debug!(%reason, "image fetch failed: {e}");
                GenerationResult::Failure(GenerationFailure {
                    reason,
                    detail: e.to_string(),
                })
            }
        }
    }

    fn name(&self) -> &str {
        "OpenAI (gpt-image)"
    }
}

/// Writes `data` to `path`, creating parent directories and replacing any
/// existing file. Goes through a sibling `.part` file so a crash never
/// leaves a truncated image at `path`.
async fn write_image(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut partial = path.as_os_str().to_owned();
    partial.push(".part");
    let partial = PathBuf::from(partial);

    let written = match tokio::fs::write(&partial, data).await {
        Ok(()) => tokio::fs::rename(&partial, path).await,
        Err(e) => Err(e),
    };
    if let Err(e) = written {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(())
}

/// Shape of a successful response, decided once after parsing.
#[derive(Debug, PartialEq, Eq)]
enum ImagePayload {
    /// Base64 image data.
    Inline(String),
    /// URL to download the image from.
    Remote(String),
    /// Neither shape present; carries the detail for the failure.
    Malformed(&'static str),
}

impl ImagePayload {
    fn from_response(response: ImagesResponse) -> Self {
        let Some(first) = response.data.into_iter().next() else {
            return Self::Malformed("no images in response");
        };

        match (first.b64_json, first.url) {
            (Some(b64), _) => Self::Inline(b64),
            (None, Some(url)) => Self::Remote(url),
            (None, None) => Self::Malformed("response contained neither b64_json nor url"),
        }
    }
}

#[derive(Debug, Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'static str,
    quality: &'static str,
}

impl<'a> ImagesRequest<'a> {
    fn from_generation_request(req: &'a GenerationRequest, model: &'a str) -> Self {
        Self {
            model,
            prompt: req.prompt(),
            n: 1,
            size: req.size().as_str(),
            quality: req.quality().as_str(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::types::{ImageSize, Quality};

    fn payload(json: &str) -> ImagePayload {
        let resp: ImagesResponse = serde_json::from_str(json).unwrap();
        ImagePayload::from_response(resp)
    }

    #[test]
    fn test_builder_with_explicit_key() {
        let fetcher = ImageFetcherBuilder::new().api_key("sk-test").build();
        assert!(fetcher.is_ok());
    }

    // The only test in this binary that touches the environment; all key
    // resolution cases run here in sequence.
    #[test]
    fn test_builder_key_resolution() {
        std::env::set_var(API_KEY_ENV, "sk-from-env");

        let fetcher = ImageFetcherBuilder::new().build().unwrap();
        assert_eq!(fetcher.api_key, "sk-from-env");

        let fetcher = ImageFetcherBuilder::new().api_key("sk-explicit").build().unwrap();
        assert_eq!(fetcher.api_key, "sk-explicit");

        let fetcher = ImageFetcherBuilder::new().api_key("   ").build().unwrap();
        assert_eq!(fetcher.api_key, "sk-from-env");

        std::env::set_var(API_KEY_ENV, "  ");
        let err = ImageFetcherBuilder::new().build().err().unwrap();
        assert!(matches!(err, BrandGenError::Config(_)));

        std::env::remove_var(API_KEY_ENV);
        let err = ImageFetcherBuilder::new().build().err().unwrap();
        assert!(matches!(err, BrandGenError::Config(_)));

        let err = ImageFetcherBuilder::new().api_key("   ").build().err().unwrap();
        assert!(matches!(err, BrandGenError::Config(_)));
    }

    #[test]
    fn test_builder_overrides() {
        let fetcher = ImageFetcher::builder()
            .api_key("sk-test")
            .endpoint("http://127.0.0.1:9/v1/images/generations")
            .model("dall-e-3")
            .request_timeout(Duration::from_secs(5))
            .download_timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        assert_eq!(fetcher.model(), "dall-e-3");
        assert_eq!(fetcher.endpoint, "http://127.0.0.1:9/v1/images/generations");
        assert_eq!(fetcher.request_timeout, Duration::from_secs(5));
        assert_eq!(fetcher.download_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_builder_debug_redacts_key() {
        let builder = ImageFetcherBuilder::new().api_key("sk-secret");
        let dbg = format!("{builder:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("<redacted>"));
    }

    #[test]
    fn test_request_serialization() {
        let req = GenerationRequest::new("A sunset", "out.png")
            .with_size(ImageSize::Landscape)
            .with_quality(Quality::Standard);
        let body = ImagesRequest::from_generation_request(&req, DEFAULT_MODEL);
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-image-1",
                "prompt": "A sunset",
                "n": 1,
                "size": "1536x1024",
                "quality": "standard",
            })
        );
    }

    #[test]
    fn test_payload_inline() {
        assert_eq!(
            payload(r#"{"data": [{"b64_json": "AQID"}]}"#),
            ImagePayload::Inline("AQID".into())
        );
    }

    #[test]
    fn test_payload_remote() {
        assert_eq!(
            payload(r#"{"data": [{"url": "https://example.com/img.png", "revised_prompt": "x"}]}"#),
            ImagePayload::Remote("https://example.com/img.png".into())
        );
    }

    #[test]
    fn test_payload_prefers_inline_when_both_present() {
        assert_eq!(
            payload(r#"{"data": [{"b64_json": "AQID", "url": "https://example.com/a.png"}]}"#),
            ImagePayload::Inline("AQID".into())
        );
    }

    #[test]
    fn test_payload_malformed() {
        assert!(matches!(
            payload(r#"{"data": []}"#),
            ImagePayload::Malformed(_)
        ));
        assert!(matches!(payload(r#"{}"#), ImagePayload::Malformed(_)));
        assert!(matches!(
            payload(r#"{"data": [{"revised_prompt": "x"}]}"#),
            ImagePayload::Malformed(_)
        ));
    }

    #[tokio::test]
    async fn test_write_image_creates_dirs_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brand").join("nested").join("logo.png");

        write_image(&path, b"first version").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first version");

        write_image(&path, b"second").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");

        let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("logo.png")]);
    }

    #[tokio::test]
    async fn test_write_image_failure_leaves_no_partial() {
        let dir = tempfile::tempdir().unwrap();

        // A non-empty directory at the destination makes the rename fail.
        let path = dir.path().join("logo.png");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let err = write_image(&path, b"image bytes").await.unwrap_err();
        assert!(matches!(err, BrandGenError::Io(_)));
        assert!(!dir.path().join("logo.png.part").exists());

        // A directory at the partial path makes the write itself fail.
        let path = dir.path().join("icon.png");
        std::fs::create_dir(dir.path().join("icon.png.part")).unwrap();

        let err = write_image(&path, b"image bytes").await.unwrap_err();
        assert!(matches!(err, BrandGenError::Io(_)));
        assert!(!path.exists());
    }
}
