//! Image generation providers.

mod openai;

pub use openai::{ImageFetcher, ImageFetcherBuilder, API_KEY_ENV};
