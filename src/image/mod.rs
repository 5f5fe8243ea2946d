//! Image generation module.

mod provider;
pub mod providers;
mod types;

pub use provider::ImageProvider;
pub use types::{
    GenerationFailure, GenerationRequest, GenerationResult, ImageFormat, ImageSize,
    PayloadSource, Quality, SavedImage,
};
