use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use image::{RgbImage, imageops::FilterType};

use crate::{
    catalog::{TrackCatalog, TrackSpec},
    color::Rgb8,
    error::{StemkitError, StemkitResult},
};

pub const DEFAULT_SAMPLE_SIZE: u32 = 150;
pub const DEFAULT_TOP_N: usize = 5;

/// One histogram bucket: an exact color and how many pixels carry it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorSample {
    pub rgb: Rgb8,
    pub count: u32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DominantColorOpts {
    /// Images are resized to `sample_size x sample_size` before tallying.
    pub sample_size: u32,
    pub top_n: usize,
    /// Exclusive bounds on mean channel brightness.
    pub min_brightness: f64,
    pub max_brightness: f64,
}

impl Default for DominantColorOpts {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            top_n: DEFAULT_TOP_N,
            min_brightness: 20.0,
            max_brightness: 235.0,
        }
    }
}

impl DominantColorOpts {
    pub fn validate(&self) -> StemkitResult<()> {
        if self.sample_size == 0 {
            return Err(StemkitError::validation("sample size must be non-zero"));
        }
        if self.top_n == 0 {
            return Err(StemkitError::validation("top-n must be at least 1"));
        }
        if self.min_brightness >= self.max_brightness {
            return Err(StemkitError::validation(
                "brightness band must have min < max",
            ));
        }
        Ok(())
    }

    fn accepts(&self, rgb: Rgb8) -> bool {
        let b = rgb.brightness();
        self.min_brightness < b && b < self.max_brightness
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct TrackColorResult {
    pub track_name: String,
    pub rgb: Rgb8,
    pub hex: String,
}

/// Exact-color histogram, most frequent first. Equal counts keep first-seen order.
pub fn color_histogram(img: &RgbImage) -> Vec<ColorSample> {
    let mut index: HashMap<Rgb8, usize> = HashMap::new();
    let mut samples: Vec<ColorSample> = Vec::new();

    for px in img.pixels() {
        let rgb = Rgb8::from(*px);
        match index.get(&rgb) {
            Some(&i) => samples[i].count += 1,
            None => {
                index.insert(rgb, samples.len());
                samples.push(ColorSample { rgb, count: 1 });
            }
        }
    }

    // Stable sort keeps insertion order among ties.
    samples.sort_by(|a, b| b.count.cmp(&a.count));
    samples
}

/// Picks the most frequent color whose brightness falls inside the band.
///
/// Falls back to the most frequent color overall when none of the top
/// `opts.top_n` colors pass the filter. Returns `None` only for empty images.
pub fn dominant_color(img: &RgbImage, opts: &DominantColorOpts) -> Option<Rgb8> {
    let resized;
    let sampled = if img.dimensions() == (opts.sample_size, opts.sample_size) {
        img
    } else {
        resized = image::imageops::resize(
            img,
            opts.sample_size,
            opts.sample_size,
            FilterType::CatmullRom,
        );
        &resized
    };

    let histogram = color_histogram(sampled);
    let top = &histogram[..histogram.len().min(opts.top_n)];

    top.iter()
        .find(|s| opts.accepts(s.rgb))
        .or_else(|| top.first())
        .map(|s| s.rgb)
}

pub fn dominant_color_of_file(path: &Path, opts: &DominantColorOpts) -> StemkitResult<Rgb8> {
    let bytes = std::fs::read(path).with_context(|| format!("read '{}'", path.display()))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| StemkitError::decode(format!("decode '{}': {e}", path.display())))?
        .to_rgb8();

    dominant_color(&img, opts)
        .ok_or_else(|| StemkitError::decode(format!("image '{}' has no pixels", path.display())))
}

/// `<root>/<folder>/artwork/<title>.png`, else the `-1000x1000` variant.
pub fn locate_artwork(root: &Path, track: &TrackSpec) -> Option<PathBuf> {
    let dir = root.join(&track.folder).join("artwork");
    [
        dir.join(format!("{}.png", track.title)),
        dir.join(format!("{}-1000x1000.png", track.title)),
    ]
    .into_iter()
    .find(|p| p.exists())
}

/// Runs the extractor over every catalog track. Per-track failures are logged and skipped.
#[tracing::instrument(skip(catalog, opts))]
pub fn extract_track_colors(
    root: &Path,
    catalog: &TrackCatalog,
    opts: &DominantColorOpts,
) -> StemkitResult<Vec<TrackColorResult>> {
    opts.validate()?;

    let mut results = Vec::new();
    for track in catalog.tracks() {
        let Some(path) = locate_artwork(root, track) else {
            tracing::warn!(track = %track.title, "artwork not found");
            continue;
        };

        tracing::info!(track = %track.title, path = %path.display(), "processing artwork");
        match dominant_color_of_file(&path, opts) {
            Ok(rgb) => {
                let hex = rgb.to_hex();
                tracing::info!(track = %track.title, "{rgb} -> {hex}");
                results.push(TrackColorResult {
                    track_name: track.title.clone(),
                    rgb,
                    hex,
                });
            }
            Err(e) => {
                tracing::error!(path = %path.display(), "error processing artwork: {e}");
            }
        }
    }

    Ok(results)
}

pub fn render_summary(results: &[TrackColorResult]) -> String {
    let rule = "=".repeat(60);
    let mut out = format!("{rule}\nSUMMARY - Track Colors\n{rule}\n");
    for r in results {
        out.push_str(&format!("{:12} | {:8} | {}\n", r.track_name, r.hex, r.rgb));
    }
    out
}

/// JavaScript literal mapping lowercase track names to hex colors.
pub fn render_js_snippet(results: &[TrackColorResult]) -> String {
    let mut out = String::from("const TRACK_COLORS = {\n");
    for r in results {
        out.push_str(&format!(
            "  '{}': '{}',\n",
            r.track_name.to_lowercase(),
            r.hex
        ));
    }
    out.push_str("};\n");
    out
}
