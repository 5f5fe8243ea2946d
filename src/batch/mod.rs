//! Sequential batch generation from prompt tables.

mod manifest;
mod runner;

pub use manifest::{Manifest, ManifestGroup, ManifestItem, PRESET_NAMES};
pub use runner::{BatchFailure, BatchJob, BatchReport, BatchRunner, BatchSuccess, DEFAULT_DELAY};
