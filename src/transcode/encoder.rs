use std::{
    ffi::OsString,
    io,
    process::{Command, Stdio},
};

use crate::{
    error::{StemkitError, StemkitResult},
    transcode::job::EncodeJob,
};

pub const DEFAULT_ENCODER: &str = "afconvert";

/// `afconvert` channel mixing strategy that downmixes to mono.
const MIX_TO_MONO: &str = "3";

/// Captured result of one external process run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    fn status_text(&self) -> String {
        match self.code {
            Some(code) => format!("exit status: {code}"),
            None => "terminated by signal".to_owned(),
        }
    }
}

/// Runs a program to completion and captures its output.
///
/// `Err` means the process could not be run at all (e.g. not found); a
/// non-zero exit is reported through [`CommandOutput::success`].
pub trait CommandRunner {
    fn run(&mut self, program: &str, args: &[OsString]) -> io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &mut R {
    fn run(&mut self, program: &str, args: &[OsString]) -> io::Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Blocking [`CommandRunner`] backed by `std::process::Command`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, program: &str, args: &[OsString]) -> io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        Ok(CommandOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

pub fn encoder_args(job: &EncodeJob, mono: bool) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "-f".into(),
        "m4af".into(),
        "-d".into(),
        "aac".into(),
        "-b".into(),
        job.bit_rate.to_string().into(),
        "-r".into(),
        job.sample_rate.to_string().into(),
    ];
    if mono {
        args.push("-s".into());
        args.push(MIX_TO_MONO.into());
    }
    args.push(job.input_path.clone().into_os_string());
    args.push(job.output_path.clone().into_os_string());
    args
}

/// Encode progress for one job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeState {
    RequestMono,
    RequestStereo,
    Done { mono: bool },
    Failed { diagnostic: String },
}

impl EncodeState {
    pub fn initial(job: &EncodeJob) -> Self {
        if job.mono {
            EncodeState::RequestMono
        } else {
            EncodeState::RequestStereo
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EncodeState::Done { .. } | EncodeState::Failed { .. })
    }
}

/// Terminal result of [`Encoder::encode`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeResult {
    /// `mono` is false when the stereo attempt produced the file.
    Done { mono: bool },
    Failed { diagnostic: String },
}

/// Drives the mono -> stereo fallback against an external encoder.
pub struct Encoder<R> {
    runner: R,
    program: String,
}

impl<R: CommandRunner> Encoder<R> {
    pub fn new(runner: R, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    pub fn into_runner(self) -> R {
        self.runner
    }

    /// Checks the encoder binary can be launched. Its exit status is ignored.
    pub fn preflight(&mut self) -> StemkitResult<()> {
        match self.runner.run(&self.program, &[OsString::from("-h")]) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StemkitError::environment(
                format!("{} not found; mobile stems require macOS", self.program),
            )),
            Err(e) => Err(StemkitError::environment(format!(
                "failed to launch {}: {e}",
                self.program
            ))),
        }
    }

    /// Advances `state` by one encoder attempt. Terminal states are returned unchanged.
    pub fn step(&mut self, job: &EncodeJob, state: EncodeState) -> EncodeState {
        let mono = match state {
            EncodeState::RequestMono => true,
            EncodeState::RequestStereo => false,
            terminal => return terminal,
        };

        let args = encoder_args(job, mono);
        tracing::debug!(program = %self.program, mono, "invoking encoder");

        match self.runner.run(&self.program, &args) {
            Ok(out) if out.success => EncodeState::Done { mono },
            Ok(out) if mono => {
                tracing::warn!(
                    input = %job.input_path.display(),
                    "mono conversion failed ({}), trying stereo fallback",
                    out.status_text()
                );
                EncodeState::RequestStereo
            }
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                let stderr = stderr.trim();
                let diagnostic = if stderr.is_empty() {
                    format!("{} exited with {}", self.program, out.status_text())
                } else {
                    stderr.to_owned()
                };
                EncodeState::Failed { diagnostic }
            }
            Err(e) => EncodeState::Failed {
                diagnostic: format!("unexpected error: {e}"),
            },
        }
    }

    /// Runs the state machine to completion.
    pub fn encode(&mut self, job: &EncodeJob) -> EncodeResult {
        let mut state = EncodeState::initial(job);
        loop {
            state = match state {
                EncodeState::Done { mono } => return EncodeResult::Done { mono },
                EncodeState::Failed { diagnostic } => return EncodeResult::Failed { diagnostic },
                pending => self.step(job, pending),
            };
        }
    }
}
