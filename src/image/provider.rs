//! Image provider trait.

use crate::image::types::{GenerationRequest, GenerationResult};
use async_trait::async_trait;

/// Trait for image generation providers.
///
/// `fetch` never returns an error: every per-image problem is folded into
/// [`GenerationResult::Failure`] so callers can keep going.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Generates the requested image and writes it to the request's output path.
    async fn fetch(&self, request: &GenerationRequest) -> GenerationResult;

    /// Returns the name of this provider for display.
    fn name(&self) -> &str;
}
