#![forbid(unsafe_code)]

pub mod artwork;
pub mod catalog;
pub mod color;
pub mod error;
pub mod palette;
pub mod transcode;

pub use artwork::{
    ColorSample, DominantColorOpts, TrackColorResult, dominant_color, extract_track_colors,
};
pub use catalog::{TrackCatalog, TrackSpec};
pub use color::{Hsl, Rgb8, parse_hex};
pub use error::{StemkitError, StemkitResult};
pub use palette::{
    PaletteEntry, PaletteScheme, PaletteSet, adjust_color, generate_palette,
    generate_rich_palette,
};
pub use transcode::{
    EncodeOutcome, TranscodeOptions, TranscodeSummary, run_transcode, run_with_config,
};
