//! Core types for image generation.

use crate::error::{BrandGenError, FailureReason};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG format (lossless).
    Png,
    /// JPEG format (lossy).
    Jpeg,
    /// WebP format (modern, efficient).
    WebP,
}

impl ImageFormat {
    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
        }
    }

    /// Detects image format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 12 {
            return None;
        }

        // PNG: 89 50 4E 47 0D 0A 1A 0A
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
            return Some(Self::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(Self::Jpeg);
        }

        // WebP: RIFF....WEBP
        if data.starts_with(b"RIFF") && &data[8..12] == b"WEBP" {
            return Some(Self::WebP);
        }

        None
    }
}

/// Output dimensions accepted by the images endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ImageSize {
    /// 1024x1024 square.
    #[default]
    #[serde(rename = "1024x1024")]
    Square,
    /// 1536x1024 landscape.
    #[serde(rename = "1536x1024")]
    Landscape,
    /// 1024x1536 portrait.
    #[serde(rename = "1024x1536")]
    Portrait,
}

impl ImageSize {
    /// Returns the size as sent on the wire (e.g., "1024x1024").
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1024x1024",
            Self::Landscape => "1536x1024",
            Self::Portrait => "1024x1536",
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = BrandGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1024x1024" => Ok(Self::Square),
            "1536x1024" => Ok(Self::Landscape),
            "1024x1536" => Ok(Self::Portrait),
            other => Err(BrandGenError::InvalidRequest(format!(
                "unsupported size '{other}' (expected 1024x1024, 1536x1024 or 1024x1536)"
            ))),
        }
    }
}

/// Rendering quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// Highest fidelity.
    #[default]
    High,
    /// Cheaper, faster rendering.
    Standard,
}

impl Quality {
    /// Returns the quality as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Standard => "standard",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = BrandGenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "standard" => Ok(Self::Standard),
            other => Err(BrandGenError::InvalidRequest(format!(
                "unsupported quality '{other}' (expected high or standard)"
            ))),
        }
    }
}

/// A request to generate one image and save it to `output`.
///
/// Fields are fixed once the request has been handed to a provider; the
/// `with_*` setters consume the request and are meant for construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    size: ImageSize,
    quality: Quality,
    output: PathBuf,
}

impl GenerationRequest {
    /// Creates a new request with default size and quality.
    pub fn new(prompt: impl Into<String>, output: impl Into<PathBuf>) -> Self {
        Self {
            prompt: prompt.into(),
            size: ImageSize::default(),
            quality: Quality::default(),
            output: output.into(),
        }
    }

    /// Sets the output dimensions.
    pub fn with_size(mut self, size: ImageSize) -> Self {
        self.size = size;
        self
    }

    /// Sets the rendering quality.
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    /// The text prompt describing the image.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The requested dimensions.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// The requested quality.
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Where the image will be written.
    pub fn output(&self) -> &Path {
        &self.output
    }
}

/// Which response shape delivered the image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadSource {
    /// Base64 data embedded in the response.
    Inline,
    /// Downloaded from a URL in the response.
    Remote,
}

/// An image that was generated and written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedImage {
    /// Path the image was written to.
    pub path: PathBuf,
    /// Number of bytes written.
    pub size_bytes: usize,
    /// Format detected from the written bytes, if recognized.
    pub format: Option<ImageFormat>,
    /// Response shape the bytes came from.
    pub source: PayloadSource,
    /// Wall time for the whole fetch in milliseconds.
    pub duration_ms: u64,
}

/// A failed generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationFailure {
    /// Failure class.
    pub reason: FailureReason,
    /// Human readable detail (truncated response body, error message).
    pub detail: String,
}

impl fmt::Display for GenerationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.detail)
    }
}

/// Outcome of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "generation result should be inspected or recorded"]
pub enum GenerationResult {
    /// The image was written to disk.
    Success(SavedImage),
    /// Nothing was written.
    Failure(GenerationFailure),
}

impl GenerationResult {
    /// Returns true for a successful fetch.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the written path on success.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Success(saved) => Some(&saved.path),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure reason, if any.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.reason),
        }
    }
}
