//! Prompt tables loaded from JSON, plus the bundled presets.

use crate::batch::runner::BatchJob;
use crate::error::{BrandGenError, Result};
use crate::image::{GenerationRequest, ImageSize, Quality};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

const PRESETS: &[(&str, &str)] = &[
    ("icons", include_str!("../../presets/icons.json")),
    ("megamenu", include_str!("../../presets/megamenu.json")),
    (
        "megamenu-transparent",
        include_str!("../../presets/megamenu-transparent.json"),
    ),
];

/// Names of the bundled presets.
pub const PRESET_NAMES: &[&str] = &["icons", "megamenu", "megamenu-transparent"];

/// A table of images to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Display title.
    #[serde(default)]
    pub title: Option<String>,
    /// Directory the item paths are relative to, itself relative to the run root.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Default size for items that do not set one.
    #[serde(default)]
    pub size: ImageSize,
    /// Default quality for items that do not set one.
    #[serde(default)]
    pub quality: Quality,
    /// Suggested pause between requests, in milliseconds.
    #[serde(default)]
    pub delay_ms: Option<u64>,
    /// Ordered sections of items.
    pub groups: Vec<ManifestGroup>,
}

/// A titled section of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestGroup {
    /// Section title shown in progress output.
    #[serde(default)]
    pub title: Option<String>,
    /// Items in generation order.
    pub items: Vec<ManifestItem>,
}

/// One image in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestItem {
    /// Display name; defaults to the file name of `path`.
    #[serde(default)]
    pub name: Option<String>,
    /// Output path relative to the manifest's output directory.
    pub path: PathBuf,
    /// Text prompt.
    pub prompt: String,
    /// Overrides the manifest size.
    #[serde(default)]
    pub size: Option<ImageSize>,
    /// Overrides the manifest quality.
    #[serde(default)]
    pub quality: Option<Quality>,
}

impl ManifestItem {
    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }
}

impl Manifest {
    /// Parses and validates a manifest from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(text)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reads a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Returns a bundled preset by name.
    pub fn preset(name: &str) -> Result<Self> {
        let (_, text) = PRESETS
            .iter()
            .find(|(preset, _)| *preset == name)
            .ok_or_else(|| {
                BrandGenError::InvalidRequest(format!(
                    "unknown preset '{name}' (available: {})",
                    PRESET_NAMES.join(", ")
                ))
            })?;
        Self::from_json(text)
    }

    /// Number of items across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.items.len()).sum()
    }

    /// Returns true if the manifest has no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The suggested pacing, if the manifest sets one.
    pub fn delay(&self) -> Option<Duration> {
        self.delay_ms.map(Duration::from_millis)
    }

    /// Expands the manifest into jobs in table order, resolving output
    /// paths against `root`.
    pub fn jobs(&self, root: impl AsRef<Path>) -> Vec<BatchJob> {
        let base = match &self.output_dir {
            Some(dir) => root.as_ref().join(dir),
            None => root.as_ref().to_path_buf(),
        };

        self.groups
            .iter()
            .flat_map(|group| {
                let base = &base;
                group.items.iter().map(move |item| {
                    let request = GenerationRequest::new(item.prompt.trim(), base.join(&item.path))
                        .with_size(item.size.unwrap_or(self.size))
                        .with_quality(item.quality.unwrap_or(self.quality));
                    BatchJob {
                        name: item.display_name(),
                        group: group.title.clone(),
                        request,
                    }
                })
            })
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(BrandGenError::InvalidRequest(
                "manifest contains no items".into(),
            ));
        }

        let mut seen = HashSet::new();
        for item in self.groups.iter().flat_map(|g| &g.items) {
            if item.prompt.trim().is_empty() {
                return Err(BrandGenError::InvalidRequest(format!(
                    "item '{}' has an empty prompt",
                    item.display_name()
                )));
            }
            if item.path.as_os_str().is_empty() {
                return Err(BrandGenError::InvalidRequest(
                    "item with empty output path".into(),
                ));
            }
            if !seen.insert(&item.path) {
                return Err(BrandGenError::InvalidRequest(format!(
                    "duplicate output path '{}'",
                    item.path.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_parse() {
        for name in PRESET_NAMES {
            let manifest = Manifest::preset(name).unwrap();
            assert!(!manifest.is_empty(), "{name} is empty");
            assert_eq!(manifest.delay(), Some(Duration::from_secs(2)));
        }
        assert_eq!(Manifest::preset("icons").unwrap().len(), 12);
        assert_eq!(Manifest::preset("megamenu").unwrap().len(), 8);
        assert_eq!(Manifest::preset("megamenu-transparent").unwrap().len(), 8);
        assert_eq!(PRESET_NAMES.len(), PRESETS.len());
    }

    #[test]
    fn test_transparent_megamenu_matches_megamenu_layout() {
        let opaque = Manifest::preset("megamenu").unwrap().jobs("/site");
        let transparent = Manifest::preset("megamenu-transparent")
            .unwrap()
            .jobs("/site");

        assert_eq!(transparent.len(), opaque.len());
        for (a, b) in opaque.iter().zip(&transparent) {
            assert_eq!(a.request.output(), b.request.output());
            assert_eq!(a.group, b.group);
            assert_ne!(a.request.prompt(), b.request.prompt());
        }
        assert!(transparent
            .iter()
            .all(|job| job.request.prompt().contains("ransparent")));
        assert_eq!(
            transparent[0].request.output(),
            Path::new("/site/public/graphics/megamenu/workspace-hero.png")
        );
    }

    #[test]
    fn test_unknown_preset() {
        let err = Manifest::preset("favicons").unwrap_err();
        assert!(err
            .to_string()
            .contains("icons, megamenu, megamenu-transparent"));
    }

    #[test]
    fn test_icons_jobs_resolve_paths() {
        let manifest = Manifest::preset("icons").unwrap();
        let jobs = manifest.jobs("/site");

        assert_eq!(jobs.len(), 12);
        assert_eq!(jobs[0].name, "peak-logo-32.png");
        assert_eq!(jobs[0].group.as_deref(), Some("Brand logo icons"));
        assert_eq!(
            jobs[0].request.output(),
            Path::new("/site/public/icons/brand/peak-logo-32.png")
        );
        assert_eq!(jobs[0].request.size(), ImageSize::Square);
        assert_eq!(jobs[0].request.quality(), Quality::High);
        assert_eq!(
            jobs[11].request.output(),
            Path::new("/site/public/icons/navigation/nav-settings-24.png")
        );
    }

    #[test]
    fn test_defaults_and_overrides() {
        let manifest = Manifest::from_json(
            r#"{
                "size": "1536x1024",
                "quality": "standard",
                "groups": [{
                    "items": [
                        {"path": "hero.png", "prompt": "  A hero banner  "},
                        {"name": "tall", "path": "sub/tall.png", "prompt": "Tall", "size": "1024x1536", "quality": "high"}
                    ]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.delay(), None);
        let jobs = manifest.jobs("out");
        assert_eq!(jobs[0].name, "hero.png");
        assert_eq!(jobs[0].group, None);
        assert_eq!(jobs[0].request.prompt(), "A hero banner");
        assert_eq!(jobs[0].request.size(), ImageSize::Landscape);
        assert_eq!(jobs[0].request.quality(), Quality::Standard);
        assert_eq!(jobs[0].request.output(), Path::new("out/hero.png"));

        assert_eq!(jobs[1].name, "tall");
        assert_eq!(jobs[1].request.size(), ImageSize::Portrait);
        assert_eq!(jobs[1].request.quality(), Quality::High);
        assert_eq!(jobs[1].request.output(), Path::new("out/sub/tall.png"));
    }

    #[test]
    fn test_rejects_bad_manifests() {
        // unknown size
        assert!(Manifest::from_json(
            r#"{"groups": [{"items": [{"path": "a.png", "prompt": "x", "size": "512x512"}]}]}"#
        )
        .is_err());

        // no items
        assert!(Manifest::from_json(r#"{"groups": [{"items": []}]}"#).is_err());

        // empty prompt
        assert!(
            Manifest::from_json(r#"{"groups": [{"items": [{"path": "a.png", "prompt": " "}]}]}"#)
                .is_err()
        );

        // duplicate path
        assert!(Manifest::from_json(
            r#"{"groups": [
                {"items": [{"path": "a.png", "prompt": "x"}]},
                {"items": [{"path": "a.png", "prompt": "y"}]}
            ]}"#
        )
        .is_err());

        // unknown field
        assert!(Manifest::from_json(
            r#"{"groups": [{"items": [{"path": "a.png", "prompt": "x", "style": "flat"}]}]}"#
        )
        .is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        std::fs::write(
            &path,
            r#"{"title": "Test", "groups": [{"title": "Only", "items": [{"path": "a.png", "prompt": "x"}]}]}"#,
        )
        .unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.title.as_deref(), Some("Test"));
        assert_eq!(manifest.len(), 1);

        assert!(matches!(
            Manifest::load(dir.path().join("missing.json")),
            Err(BrandGenError::Io(_))
        ));
    }
}
