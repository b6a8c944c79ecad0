//! Mobile stem transcoding: folder scan, per-file settings, `afconvert` with mono fallback.

pub mod config;
pub mod encoder;
pub mod job;

use std::{
    fmt,
    path::{Path, PathBuf},
};

pub use config::{LoadedConfig, StemConfig, StemConfigMap};
pub use encoder::{
    CommandOutput, CommandRunner, DEFAULT_ENCODER, EncodeResult, EncodeState, Encoder,
    SystemRunner,
};
pub use job::{EncodeJob, MOBILE_SUFFIX, Planned, SkipReason};

use crate::error::StemkitResult;

#[derive(Clone, Debug)]
pub struct TranscodeOptions {
    pub folder: PathBuf,
    pub config_path: Option<PathBuf>,
    pub encoder: String,
}

impl TranscodeOptions {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            config_path: None,
            encoder: DEFAULT_ENCODER.to_owned(),
        }
    }

    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn with_encoder(mut self, encoder: impl Into<String>) -> Self {
        self.encoder = encoder.into();
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FileSizes {
    pub input_bytes: u64,
    pub output_bytes: u64,
}

impl FileSizes {
    /// `(in - out) / in * 100`; zero for an empty input.
    pub fn reduction_percent(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        let input = self.input_bytes as f64;
        (input - self.output_bytes as f64) / input * 100.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EncodeOutcome {
    pub job: EncodeJob,
    pub succeeded: bool,
    /// False when mono was requested but the stereo fallback produced the file.
    pub used_mono: bool,
    pub sizes: Option<FileSizes>,
    pub diagnostic: Option<String>,
}

impl EncodeOutcome {
    pub fn fell_back_to_stereo(&self) -> bool {
        self.succeeded && self.job.mono && !self.used_mono
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranscodeSummary {
    pub found: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub config_source: Option<PathBuf>,
    pub outcomes: Vec<EncodeOutcome>,
}

impl fmt::Display for TranscodeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "Processing complete!")?;
        writeln!(f, "  Successful: {}", self.succeeded)?;
        writeln!(f, "  Failed: {}", self.failed)?;
        write!(f, "  Skipped: {}", self.skipped)
    }
}

fn measure(job: &EncodeJob) -> Option<FileSizes> {
    let size = |p: &Path| match std::fs::metadata(p) {
        Ok(m) => Some(m.len()),
        Err(e) => {
            tracing::warn!(path = %p.display(), "could not stat file: {e}");
            None
        }
    };
    Some(FileSizes {
        input_bytes: size(&job.input_path)?,
        output_bytes: size(&job.output_path)?,
    })
}

fn mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

pub fn run_job<R: CommandRunner>(encoder: &mut Encoder<R>, job: EncodeJob) -> EncodeOutcome {
    tracing::info!(
        input = %job.input_path.display(),
        output = %job.output_path.display(),
        settings = %job.settings_label(),
        "processing"
    );

    match encoder.encode(&job) {
        EncodeResult::Done { mono } => {
            let sizes = measure(&job);
            if let Some(s) = sizes {
                tracing::info!(
                    "success: {:.2} MB -> {:.2} MB ({:.1}% reduction)",
                    mb(s.input_bytes),
                    mb(s.output_bytes),
                    s.reduction_percent()
                );
            }
            let outcome = EncodeOutcome {
                job,
                succeeded: true,
                used_mono: mono,
                sizes,
                diagnostic: None,
            };
            if outcome.fell_back_to_stereo() {
                tracing::info!("used stereo; mono conversion not supported by the encoder");
            }
            outcome
        }
        EncodeResult::Failed { diagnostic } => {
            tracing::error!(input = %job.input_path.display(), "error processing file: {diagnostic}");
            EncodeOutcome {
                job,
                succeeded: false,
                used_mono: false,
                sizes: None,
                diagnostic: Some(diagnostic),
            }
        }
    }
}

/// Transcodes every stem in `opts.folder`.
///
/// Fails only for environment problems (folder missing, encoder missing);
/// per-file encode failures are recorded in the summary.
#[tracing::instrument(skip_all, fields(folder = %opts.folder.display()))]
pub fn run_transcode<R: CommandRunner>(
    opts: &TranscodeOptions,
    runner: R,
) -> StemkitResult<TranscodeSummary> {
    let files = job::scan_folder(&opts.folder)?;
    let loaded = config::resolve(&opts.folder, opts.config_path.as_deref());
    run_with_config(&files, loaded, &opts.encoder, runner)
}

/// Same as [`run_transcode`] with the file list and configuration already resolved.
pub fn run_with_config<R: CommandRunner>(
    files: &[PathBuf],
    loaded: Option<LoadedConfig>,
    encoder_program: &str,
    runner: R,
) -> StemkitResult<TranscodeSummary> {
    let mut summary = TranscodeSummary {
        found: files.len(),
        config_source: loaded.as_ref().map(|c| c.source.clone()),
        ..TranscodeSummary::default()
    };

    if files.is_empty() {
        tracing::info!("no {} files found", job::STEM_EXTENSION);
        return Ok(summary);
    }
    tracing::info!("found {} {} file(s)", files.len(), job::STEM_EXTENSION);

    let mut encoder = Encoder::new(runner, encoder_program);
    encoder.preflight()?;

    let stems = loaded.as_ref().map(|c| &c.stems);
    for planned in job::plan_jobs(files, stems) {
        match planned {
            Planned::Skip { path, reason } => {
                tracing::info!(path = %path.display(), "skipping ({})", reason.describe());
                summary.skipped += 1;
            }
            Planned::Job(job) => {
                let outcome = run_job(&mut encoder, job);
                if outcome.succeeded {
                    summary.succeeded += 1;
                } else {
                    summary.failed += 1;
                }
                summary.outcomes.push(outcome);
            }
        }
    }

    Ok(summary)
}
