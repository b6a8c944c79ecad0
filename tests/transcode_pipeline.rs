use std::{
    ffi::OsString,
    io,
    path::{Path, PathBuf},
};

use stemkit::{
    StemkitError, TranscodeOptions, run_transcode,
    transcode::{CommandOutput, CommandRunner, MOBILE_SUFFIX},
};

/// Stands in for `afconvert`: writes a small output file unless told to fail.
#[derive(Default)]
struct FakeEncoder {
    fail_mono: bool,
    fail_stereo_for: Vec<String>,
    missing: bool,
    calls: Vec<Vec<String>>,
}

impl CommandRunner for FakeEncoder {
    fn run(&mut self, _program: &str, args: &[OsString]) -> io::Result<CommandOutput> {
        if self.missing {
            return Err(io::Error::from(io::ErrorKind::NotFound));
        }
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        self.calls.push(args.clone());

        if args == ["-h"] {
            return Ok(CommandOutput {
                success: false,
                code: Some(1),
                ..CommandOutput::default()
            });
        }

        let mono = args.iter().any(|a| a == "-s");
        let input = &args[args.len() - 2];
        let output = &args[args.len() - 1];
        let name = Path::new(input).file_name().unwrap().to_string_lossy();

        let fails = (mono && self.fail_mono)
            || (!mono && self.fail_stereo_for.iter().any(|f| *f == name));
        if fails {
            return Ok(CommandOutput {
                success: false,
                code: Some(1),
                stderr: format!("cannot encode {name}").into_bytes(),
                ..CommandOutput::default()
            });
        }

        std::fs::write(output, vec![0u8; 25])?;
        Ok(CommandOutput {
            success: true,
            code: Some(0),
            ..CommandOutput::default()
        })
    }
}

fn stem_folder(names: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        std::fs::write(dir.path().join(name), vec![1u8; 100]).unwrap();
    }
    dir
}

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("stems.json");
    std::fs::write(&path, body).unwrap();
    path
}

fn encoded_inputs(calls: &[Vec<String>]) -> Vec<String> {
    calls
        .iter()
        .filter(|c| c.len() > 1)
        .map(|c| {
            Path::new(&c[c.len() - 2])
                .file_name()
                .unwrap()
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

#[test]
fn mobile_outputs_are_skipped_and_never_encoded() {
    let dir = stem_folder(&["vox.m4a", "vox_mobile.m4a", "drums.m4a"]);
    let mut fake = FakeEncoder::default();

    let summary = run_transcode(&TranscodeOptions::new(dir.path()), &mut fake).unwrap();

    assert_eq!(summary.found, 3);
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.skipped, 1);
    assert_eq!(encoded_inputs(&fake.calls), vec!["drums.m4a", "vox.m4a"]);

    for outcome in &summary.outcomes {
        let out_name = outcome.job.output_path.file_name().unwrap().to_string_lossy();
        assert!(out_name.ends_with(&format!("{MOBILE_SUFFIX}.m4a")));
        let sizes = outcome.sizes.unwrap();
        assert_eq!(sizes.input_bytes, 100);
        assert_eq!(sizes.output_bytes, 25);
        assert_eq!(sizes.reduction_percent(), 75.0);
    }
}

#[test]
fn mono_failure_falls_back_to_stereo_success() {
    let dir = stem_folder(&["vox.m4a"]);
    write_config(
        dir.path(),
        r#"{"hydrogen": [{"filename": "vox.m4a", "mono": true}]}"#,
    );
    let mut fake = FakeEncoder {
        fail_mono: true,
        ..FakeEncoder::default()
    };

    let summary = run_transcode(&TranscodeOptions::new(dir.path()), &mut fake).unwrap();

    assert_eq!(summary.succeeded, 1);
    let outcome = &summary.outcomes[0];
    assert!(outcome.job.mono);
    assert!(outcome.succeeded);
    assert!(!outcome.used_mono);
    assert!(outcome.fell_back_to_stereo());
    assert_eq!(summary.config_source, Some(dir.path().join("stems.json")));
}

#[test]
fn double_failure_reports_stereo_diagnostic_and_continues() {
    let dir = stem_folder(&["bass.m4a", "vox.m4a"]);
    write_config(
        dir.path(),
        r#"{"t": [{"filename": "vox.m4a", "mono": true}]}"#,
    );
    let mut fake = FakeEncoder {
        fail_mono: true,
        fail_stereo_for: vec!["vox.m4a".to_owned()],
        ..FakeEncoder::default()
    };

    let summary = run_transcode(&TranscodeOptions::new(dir.path()), &mut fake).unwrap();

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);
    let failed = summary.outcomes.iter().find(|o| !o.succeeded).unwrap();
    assert_eq!(failed.diagnostic.as_deref(), Some("cannot encode vox.m4a"));
    assert!(failed.sizes.is_none());
}

#[test]
fn explicit_config_beats_folder_config() {
    let dir = stem_folder(&["vox.m4a"]);
    write_config(
        dir.path(),
        r#"{"t": [{"filename": "vox.m4a", "mono": false}]}"#,
    );
    let explicit_dir = tempfile::tempdir().unwrap();
    let explicit = explicit_dir.path().join("custom.json");
    std::fs::write(&explicit, r#"{"t": [{"filename": "vox.m4a", "mono": true}]}"#).unwrap();

    let mut fake = FakeEncoder::default();
    let opts = TranscodeOptions::new(dir.path()).with_config_path(&explicit);
    let summary = run_transcode(&opts, &mut fake).unwrap();

    assert_eq!(summary.config_source, Some(explicit));
    assert!(summary.outcomes[0].used_mono);
    assert!(fake.calls.iter().any(|c| c.iter().any(|a| a == "-s")));
}

#[test]
fn missing_encoder_is_fatal_before_any_job() {
    let dir = stem_folder(&["vox.m4a"]);
    let mut fake = FakeEncoder {
        missing: true,
        ..FakeEncoder::default()
    };

    let err = run_transcode(&TranscodeOptions::new(dir.path()), &mut fake).unwrap_err();
    assert!(matches!(err, StemkitError::Environment(_)));
    assert!(!dir.path().join("vox_mobile.m4a").exists());
}

#[test]
fn empty_folder_does_no_work() {
    let dir = stem_folder(&["notes.txt", "mix.wav"]);
    let mut fake = FakeEncoder::default();

    let summary = run_transcode(&TranscodeOptions::new(dir.path()), &mut fake).unwrap();
    assert_eq!(summary.found, 0);
    assert!(fake.calls.is_empty());
}

#[test]
fn missing_folder_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_transcode(
        &TranscodeOptions::new(dir.path().join("nope")),
        FakeEncoder::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("folder not found"));
}
