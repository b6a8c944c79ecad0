use std::{collections::BTreeSet, fs::File, io::BufReader, path::Path};

use anyhow::Context as _;

use crate::{
    color::{Rgb8, parse_hex},
    error::{StemkitError, StemkitResult},
};

/// One release track: where its artwork lives and how its stems are colored.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrackSpec {
    /// Lowercase key used in generated palettes and snippets.
    pub id: String,
    /// Release folder holding the track, e.g. `1.Hydrogen`.
    pub folder: String,
    /// Display title; also the artwork file stem.
    pub title: String,
    pub base_color: String,
    pub stem_count: usize,
}

impl TrackSpec {
    fn new(id: &str, folder: &str, title: &str, base_color: &str, stem_count: usize) -> Self {
        Self {
            id: id.to_owned(),
            folder: folder.to_owned(),
            title: title.to_owned(),
            base_color: base_color.to_owned(),
            stem_count,
        }
    }

    pub fn base_rgb(&self) -> StemkitResult<Rgb8> {
        parse_hex(&self.base_color)
    }
}

/// Read-only track table shared by the artwork and palette tools.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TrackCatalog {
    tracks: Vec<TrackSpec>,
}

impl TrackCatalog {
    pub fn builtin() -> Self {
        Self {
            tracks: vec![
                TrackSpec::new("hydrogen", "1.Hydrogen", "Hydrogen", "#25daf0", 12),
                TrackSpec::new("lithium", "2.Lithium", "Lithium", "#cf2739", 38),
                TrackSpec::new("sodium", "3.Sodium", "Sodium", "#f7ca47", 28),
                TrackSpec::new("potassium", "4.Potassium", "Potassium", "#8f01ff", 19),
                TrackSpec::new("rubidium", "5.Rubidium", "Rubidium", "#c71585", 9),
                TrackSpec::new("caesium", "6.Caesium", "Caesium", "#afa0ef", 16),
                TrackSpec::new("francium", "7.Francium", "Francium", "#c1c1c1", 26),
            ],
        }
    }

    pub fn new(tracks: Vec<TrackSpec>) -> StemkitResult<Self> {
        let catalog = Self { tracks };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_json_str(s: &str) -> StemkitResult<Self> {
        let catalog: Self = serde_json::from_str(s)
            .map_err(|e| StemkitError::config(format!("parse track catalog: {e}")))?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: &Path) -> StemkitResult<Self> {
        let f = File::open(path)
            .with_context(|| format!("open track catalog '{}'", path.display()))?;
        let catalog: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            StemkitError::config(format!("parse track catalog '{}': {e}", path.display()))
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn validate(&self) -> StemkitResult<()> {
        if self.tracks.is_empty() {
            return Err(StemkitError::validation("track catalog is empty"));
        }

        let mut seen = BTreeSet::new();
        for track in &self.tracks {
            if track.id.trim().is_empty() {
                return Err(StemkitError::validation("track id must be non-empty"));
            }
            if track.title.trim().is_empty() {
                return Err(StemkitError::validation(format!(
                    "track '{}' has an empty title",
                    track.id
                )));
            }
            if !seen.insert(track.id.as_str()) {
                return Err(StemkitError::validation(format!(
                    "duplicate track id '{}'",
                    track.id
                )));
            }
            track.base_rgb().map_err(|e| {
                StemkitError::validation(format!("track '{}': {e}", track.id))
            })?;
        }
        Ok(())
    }

    pub fn tracks(&self) -> &[TrackSpec] {
        &self.tracks
    }
}

impl Default for TrackCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
