use std::path::Path;

use anyhow::Context as _;
use serde::ser::SerializeMap as _;

use crate::{
    catalog::TrackCatalog,
    color::{Hsl, Rgb8},
    error::{StemkitError, StemkitResult},
};

/// Named hue relationships a palette can be built from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaletteScheme {
    Analogous,
    Complementary,
    Triadic,
    Tetradic,
    SplitComplementary,
    Monochromatic,
    /// Triadic, then split-complementary, then analogous, then evenly spread fill.
    #[default]
    Rich,
}

impl PaletteScheme {
    pub const ALL: [PaletteScheme; 7] = [
        PaletteScheme::Analogous,
        PaletteScheme::Complementary,
        PaletteScheme::Triadic,
        PaletteScheme::Tetradic,
        PaletteScheme::SplitComplementary,
        PaletteScheme::Monochromatic,
        PaletteScheme::Rich,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PaletteScheme::Analogous => "analogous",
            PaletteScheme::Complementary => "complementary",
            PaletteScheme::Triadic => "triadic",
            PaletteScheme::Tetradic => "tetradic",
            PaletteScheme::SplitComplementary => "split-complementary",
            PaletteScheme::Monochromatic => "monochromatic",
            PaletteScheme::Rich => "rich",
        }
    }
}

/// Shifts hue by `hue_shift_deg` and scales saturation/lightness.
///
/// Saturation is capped at 1; lightness is clamped to 0..1.
pub fn adjust_color(
    base: Rgb8,
    hue_shift_deg: f64,
    saturation_factor: f64,
    lightness_factor: f64,
) -> Rgb8 {
    let Hsl { h, s, l } = base.to_hsl();

    let h = (h + hue_shift_deg / 360.0).rem_euclid(1.0);
    let s = (s * saturation_factor).min(1.0);
    let l = (l * lightness_factor).clamp(0.0, 1.0);

    Rgb8::from_hsl(Hsl { h, s, l })
}

fn rotate(base: Rgb8, hue_shift_deg: f64) -> Rgb8 {
    adjust_color(base, hue_shift_deg, 1.0, 1.0)
}

/// Palette of exactly `num_colors` colors whose first entry is `base`.
pub fn generate_rich_palette(base: Rgb8, num_colors: usize) -> Vec<Rgb8> {
    let mut palette = vec![base];

    palette.push(rotate(base, 120.0));
    palette.push(rotate(base, 240.0));

    if num_colors > 3 {
        palette.push(rotate(base, 150.0));
        palette.push(rotate(base, 210.0));
    }

    if num_colors > 5 {
        palette.push(rotate(base, 30.0));
        palette.push(rotate(base, -30.0));
    }

    let remaining = num_colors.saturating_sub(palette.len());
    if remaining > 0 {
        let step = 360 / remaining;
        for i in 0..remaining {
            let angle = (60 + i * step) % 360;
            let sat_factor = 0.8 + (i % 3) as f64 * 0.1;
            let light_factor = 0.9 + (i % 4) as f64 * 0.05;
            palette.push(adjust_color(base, angle as f64, sat_factor, light_factor));
        }
    }

    palette.truncate(num_colors);
    palette
}

pub fn generate_palette(base: Rgb8, num_colors: usize, scheme: PaletteScheme) -> Vec<Rgb8> {
    let mut palette = vec![base];

    match scheme {
        PaletteScheme::Rich => return generate_rich_palette(base, num_colors),
        PaletteScheme::Analogous => {
            const ANGLES: [f64; 8] = [30.0, -30.0, 60.0, -60.0, 90.0, -90.0, 120.0, -120.0];
            let take = num_colors.saturating_sub(1);
            palette.extend(ANGLES.iter().take(take).map(|&a| rotate(base, a)));
        }
        PaletteScheme::Complementary => {
            palette.push(rotate(base, 180.0));
            for i in 2..num_colors {
                palette.push(rotate(base, (180 + (i - 1) * 30) as f64));
            }
        }
        PaletteScheme::Triadic => {
            palette.push(rotate(base, 120.0));
            palette.push(rotate(base, 240.0));
            for i in 3..num_colors {
                palette.push(rotate(base, ((i * 40) % 360) as f64));
            }
        }
        PaletteScheme::Tetradic => {
            palette.push(rotate(base, 90.0));
            palette.push(rotate(base, 180.0));
            palette.push(rotate(base, 270.0));
            for i in 4..num_colors {
                palette.push(rotate(base, ((i * 45) % 360) as f64));
            }
        }
        PaletteScheme::SplitComplementary => {
            palette.push(rotate(base, 150.0));
            palette.push(rotate(base, 210.0));
            for i in 3..num_colors {
                palette.push(rotate(base, ((i * 30) % 360) as f64));
            }
        }
        PaletteScheme::Monochromatic => {
            for i in 1..num_colors {
                let lightness_factor = 0.6 + i as f64 * 0.15;
                let saturation_factor = 0.7 + i as f64 * 0.1;
                palette.push(adjust_color(
                    base,
                    0.0,
                    saturation_factor,
                    lightness_factor,
                ));
            }
        }
    }

    palette.truncate(num_colors);
    palette
}

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PaletteEntry {
    pub track_name: String,
    pub base_color: String,
    pub stem_count: usize,
    pub colors: Vec<String>,
}

/// Palettes keyed by track name, in catalog order.
///
/// Serializes as a JSON object mapping each track name to its color list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PaletteSet {
    entries: Vec<PaletteEntry>,
}

impl PaletteSet {
    pub fn generate(catalog: &TrackCatalog, scheme: PaletteScheme) -> StemkitResult<Self> {
        let mut entries = Vec::with_capacity(catalog.tracks().len());
        for track in catalog.tracks() {
            let base = track.base_rgb()?;
            let colors = generate_palette(base, track.stem_count, scheme)
                .into_iter()
                .map(Rgb8::to_hex)
                .collect();
            entries.push(PaletteEntry {
                track_name: track.id.clone(),
                base_color: base.to_hex(),
                stem_count: track.stem_count,
                colors,
            });
        }

        tracing::debug!(tracks = entries.len(), scheme = scheme.name(), "generated palettes");
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    pub fn get(&self, track_name: &str) -> Option<&PaletteEntry> {
        self.entries.iter().find(|e| e.track_name == track_name)
    }

    pub fn to_json_pretty(&self) -> StemkitResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StemkitError::serde(e.to_string()))
    }

    pub fn write_json(&self, path: &Path) -> StemkitResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        let json = self.to_json_pretty()?;
        std::fs::write(path, json)
            .with_context(|| format!("write palettes '{}'", path.display()))?;
        Ok(())
    }

    /// Human-readable listing, one block per track.
    pub fn render_listing(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str(&format!("\n{}\n", entry.track_name.to_uppercase()));
            out.push_str(&format!("Base Color: {}\n", entry.base_color));
            out.push_str(&format!("Stems: {}\n", entry.stem_count));
            out.push_str(&format!("{}\n", "-".repeat(40)));
            for (i, color) in entry.colors.iter().enumerate() {
                out.push_str(&format!("  {:2}. {color}\n", i + 1));
            }
        }
        out
    }
}

impl serde::Serialize for PaletteSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.track_name, &entry.colors)?;
        }
        map.end()
    }
}
