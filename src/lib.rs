#![warn(missing_docs)]
//! brandgen - Branding icons and illustrations from the OpenAI images API.
//!
//! The crate wraps one operation: send a prompt to the image generation
//! endpoint, take the image back either inline (base64) or through a
//! download URL, and write it to a path on disk. Every call ends in a
//! [`GenerationResult`]; transport faults, bad statuses and odd response
//! bodies become failure values instead of errors, so a batch keeps going.
//!
//! # Quick Start
//!
//! ```no_run
//! use brandgen::{GenerationRequest, ImageFetcher, ImageProvider, ImageSize};
//!
//! #[tokio::main]
//! async fn main() -> brandgen::Result<()> {
//!     let fetcher = ImageFetcher::builder().build()?;
//!     let request = GenerationRequest::new("Minimalist mountain logo", "icons/logo.png")
//!         .with_size(ImageSize::Square);
//!     match fetcher.fetch(&request).await {
//!         brandgen::GenerationResult::Success(saved) => println!("saved {}", saved.path.display()),
//!         brandgen::GenerationResult::Failure(failure) => eprintln!("failed: {failure}"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Batches
//!
//! ```no_run
//! use brandgen::{BatchRunner, ImageFetcher, Manifest};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> brandgen::Result<()> {
//!     let manifest = Manifest::preset("icons")?;
//!     let runner = BatchRunner::new(ImageFetcher::builder().build()?)
//!         .with_delay(Duration::from_secs(2));
//!     let report = runner.run(&manifest.jobs(".")).await;
//!     println!("{} ok, {} failed", report.succeeded.len(), report.failed.len());
//!     Ok(())
//! }
//! ```

pub mod batch;
mod error;
pub mod image;

// Re-export error types at crate root
pub use error::{BrandGenError, FailureReason, Result};

pub use batch::{BatchJob, BatchReport, BatchRunner, Manifest};
pub use image::providers::{ImageFetcher, ImageFetcherBuilder};
pub use image::{
    GenerationFailure, GenerationRequest, GenerationResult, ImageFormat, ImageProvider, ImageSize,
    PayloadSource, Quality, SavedImage,
};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::batch::{BatchJob, BatchReport, BatchRunner, Manifest};
    pub use crate::error::{BrandGenError, FailureReason, Result};
    pub use crate::image::providers::ImageFetcher;
    pub use crate::image::{GenerationRequest, GenerationResult, ImageProvider};
}
