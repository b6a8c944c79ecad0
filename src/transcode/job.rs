use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    error::{StemkitError, StemkitResult},
    transcode::config::StemConfigMap,
};

pub const STEM_EXTENSION: &str = "m4a";
pub const MOBILE_SUFFIX: &str = "_mobile";
pub const MOBILE_SAMPLE_RATE: u32 = 16_000;
pub const MOBILE_BIT_RATE: u32 = 48_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodeJob {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub sample_rate: u32,
    pub bit_rate: u32,
    pub mono: bool,
    /// Whether a per-file config entry was found.
    pub configured: bool,
}

impl EncodeJob {
    pub fn settings_label(&self) -> String {
        let channels = if self.mono { "mono" } else { "stereo" };
        let mut label = format!(
            "{}kHz, {}kbps, {channels}",
            self.sample_rate / 1000,
            self.bit_rate / 1000
        );
        if !self.configured {
            label.push_str(" (default)");
        }
        label
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The file is itself a mobile output.
    AlreadyMobile,
}

impl SkipReason {
    pub fn describe(self) -> &'static str {
        match self {
            SkipReason::AlreadyMobile => "already mobile",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Planned {
    Job(EncodeJob),
    Skip { path: PathBuf, reason: SkipReason },
}

fn is_mobile_stem(path: &Path) -> bool {
    path.file_stem()
        .map(|s| s.to_string_lossy().contains(MOBILE_SUFFIX))
        .unwrap_or(false)
}

/// `<stem>_mobile.<ext>` next to the input, or `None` for files that are already mobile outputs.
pub fn mobile_output_path(input: &Path) -> Option<PathBuf> {
    if is_mobile_stem(input) {
        return None;
    }
    let stem = input.file_stem()?.to_string_lossy();
    let name = match input.extension() {
        Some(ext) => format!("{stem}{MOBILE_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{MOBILE_SUFFIX}"),
    };
    Some(input.with_file_name(name))
}

/// Non-recursive listing of `*.m4a` files in `folder`, sorted by name.
pub fn scan_folder(folder: &Path) -> StemkitResult<Vec<PathBuf>> {
    if !folder.exists() {
        return Err(StemkitError::environment(format!(
            "folder not found: {}",
            folder.display()
        )));
    }
    if !folder.is_dir() {
        return Err(StemkitError::environment(format!(
            "path is not a directory: {}",
            folder.display()
        )));
    }

    let mut files = Vec::new();
    let entries =
        std::fs::read_dir(folder).with_context(|| format!("list '{}'", folder.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("list '{}'", folder.display()))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().is_some_and(|ext| ext == STEM_EXTENSION) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

pub fn plan_job(input: &Path, config: Option<&StemConfigMap>) -> Planned {
    let Some(output_path) = mobile_output_path(input) else {
        return Planned::Skip {
            path: input.to_path_buf(),
            reason: SkipReason::AlreadyMobile,
        };
    };

    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem_config = config.and_then(|c| c.get(&file_name));

    Planned::Job(EncodeJob {
        input_path: input.to_path_buf(),
        output_path,
        sample_rate: MOBILE_SAMPLE_RATE,
        bit_rate: MOBILE_BIT_RATE,
        mono: stem_config.is_some_and(|s| s.mono),
        configured: stem_config.is_some(),
    })
}

pub fn plan_jobs(files: &[PathBuf], config: Option<&StemConfigMap>) -> Vec<Planned> {
    files.iter().map(|f| plan_job(f, config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_inserts_suffix_before_extension() {
        let input = Path::new("/stems/7.Francium_Stem_VOX LEAD.m4a");
        let out = mobile_output_path(input).unwrap();
        assert_eq!(
            out,
            PathBuf::from("/stems/7.Francium_Stem_VOX LEAD_mobile.m4a")
        );
        assert_ne!(out, input);
    }

    #[test]
    fn output_names_always_differ_from_inputs() {
        for name in ["a.m4a", "mobile.m4a", "x.y.m4a", "noext", "_mobil.m4a"] {
            let input = PathBuf::from("/d").join(name);
            let out = mobile_output_path(&input).unwrap();
            assert_ne!(out, input, "{name}");
            assert!(
                out.file_stem()
                    .unwrap()
                    .to_string_lossy()
                    .ends_with(MOBILE_SUFFIX)
            );
            assert_eq!(out.extension(), input.extension());
        }
    }

    #[test]
    fn mobile_marker_anywhere_in_stem_is_skipped() {
        for name in ["a_mobile.m4a", "a_mobile_v2.m4a", "_mobile.m4a"] {
            let planned = plan_job(&PathBuf::from("/d").join(name), None);
            assert!(
                matches!(
                    planned,
                    Planned::Skip {
                        reason: SkipReason::AlreadyMobile,
                        ..
                    }
                ),
                "{name}"
            );
        }
    }

    #[test]
    fn parameters_are_fixed_and_mono_comes_from_config() {
        let config = StemConfigMap::from_json_str(
            r#"{"t": [{"filename": "vox.m4a", "mono": true}, {"filename": "gtr.m4a"}]}"#,
        )
        .unwrap();

        let Planned::Job(vox) = plan_job(Path::new("/d/vox.m4a"), Some(&config)) else {
            panic!("expected a job");
        };
        assert!(vox.mono);
        assert!(vox.configured);
        assert_eq!(vox.sample_rate, 16_000);
        assert_eq!(vox.bit_rate, 48_000);
        assert_eq!(vox.settings_label(), "16kHz, 48kbps, mono");

        let Planned::Job(gtr) = plan_job(Path::new("/d/gtr.m4a"), Some(&config)) else {
            panic!("expected a job");
        };
        assert!(!gtr.mono);
        assert_eq!(gtr.settings_label(), "16kHz, 48kbps, stereo");

        let Planned::Job(other) = plan_job(Path::new("/d/other.m4a"), None) else {
            panic!("expected a job");
        };
        assert!(!other.mono);
        assert!(!other.configured);
        assert_eq!(other.settings_label(), "16kHz, 48kbps, stereo (default)");
    }

    #[test]
    fn scan_lists_only_top_level_m4a_files() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.m4a", "a.m4a", "c.wav", "d.M4A"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.m4a")).unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("e.m4a"), b"x").unwrap();

        let files = scan_folder(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.m4a", "b.m4a"]);
    }

    #[test]
    fn scan_rejects_missing_folder_and_plain_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = scan_folder(&dir.path().join("missing")).unwrap_err();
        assert!(matches!(err, StemkitError::Environment(_)));

        let file = dir.path().join("f.m4a");
        std::fs::write(&file, b"x").unwrap();
        let err = scan_folder(&file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
