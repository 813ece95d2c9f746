// src/system/executor.rs

//! Runs the external audio encoder used for `-rec` recordings.

use crate::core::paths::{self, PathError};
use crate::core::pipeline::PhraseRecorder;
use crate::system::audio::sound_tag;
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command as StdCommand, Stdio};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// How long the encoder gets to finish the file after being asked to stop.
const STOP_GRACE: Duration = Duration::from_secs(3);

const OUTPUT_PLACEHOLDER: &str = "{output}";

#[derive(Error, Debug)]
pub enum RecordingError {
    #[error("Recorder command could not be parsed: {0}")]
    CommandParse(String),
    #[error("No recorder command is configured.")]
    EmptyCommand,
    #[error("Recorder command has no {{output}} placeholder: {0}")]
    MissingOutput(String),
    #[error("'{0}' was not found in PATH.")]
    NotInstalled(String),
    #[error("Recorder '{0}' could not be executed: {1}")]
    CommandFailed(String, io::Error),
    #[error("Recorder '{0}' exited with a non-zero error code.")]
    NonZeroExitStatus(String),
    #[error(transparent)]
    Path(#[from] PathError),
}

pub fn is_executable_in_path(executable_name: &str) -> bool {
    let candidate = Path::new(executable_name);
    if candidate.components().count() > 1 {
        return candidate.is_file();
    }
    if let Ok(path_var) = env::var("PATH") {
        for path in env::split_paths(&path_var) {
            if path.join(executable_name).is_file()
                || (cfg!(target_os = "windows") && path.join(format!("{}.exe", executable_name)).is_file())
            {
                return true;
            }
        }
    }
    false
}

/// Splits the configured template into program and arguments, with every
/// `{output}` replaced by `output`.
pub fn build_command(template: &str, output: &Path) -> Result<(String, Vec<String>), RecordingError> {
    let trimmed = template.trim();
    if trimmed.is_empty() {
        return Err(RecordingError::EmptyCommand);
    }
    if !trimmed.contains(OUTPUT_PLACEHOLDER) {
        return Err(RecordingError::MissingOutput(trimmed.to_string()));
    }

    let output = output.display().to_string();
    let mut parts = shlex::split(trimmed)
        .ok_or_else(|| RecordingError::CommandParse(trimmed.to_string()))?
        .into_iter()
        .map(|part| part.replace(OUTPUT_PLACEHOLDER, &output));
    let program = parts.next().ok_or(RecordingError::EmptyCommand)?;
    Ok((program, parts.collect()))
}

/// `<phrase>-<unix seconds>.mp3`, with the phrase reduced to a safe file name.
fn output_name(phrase: &str) -> String {
    let stem: String = phrase
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "recording".to_string() } else { stem };
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    format!("{}-{}.mp3", stem, seconds)
}

/// Records microphone audio with an external encoder.
#[derive(Debug, Clone)]
pub struct Recorder {
    template: String,
    dir: PathBuf,
}

impl Recorder {
    pub fn new(template: impl Into<String>, dir: PathBuf) -> Self {
        Self {
            template: template.into(),
            dir,
        }
    }

    /// Checks the command without running it.
    pub fn check(&self) -> Result<(), RecordingError> {
        let (program, _) = build_command(&self.template, &self.dir.join("probe.mp3"))?;
        if is_executable_in_path(&program) {
            Ok(())
        } else {
            Err(RecordingError::NotInstalled(program))
        }
    }

    /// Starts the encoder, blocks in `wait_for_stop` and then stops it.
    /// Returns the recorded file.
    pub fn record_with(
        &self,
        phrase: &str,
        wait_for_stop: impl FnOnce() -> io::Result<()>,
    ) -> Result<PathBuf, RecordingError> {
        self.check()?;
        paths::ensure_dir(&self.dir)?;
        let output = self.dir.join(output_name(phrase));
        let (program, args) = build_command(&self.template, &output)?;
        log::debug!("Recording with '{}' {:?}", program, args);

        let mut child = StdCommand::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| RecordingError::CommandFailed(program.clone(), e))?;

        let waited = wait_for_stop();
        stop(&mut child, &program)?;
        waited.map_err(|e| RecordingError::CommandFailed(program.clone(), e))?;

        if output.is_file() {
            Ok(output)
        } else {
            Err(RecordingError::NonZeroExitStatus(program))
        }
    }
}

/// Asks the encoder to quit (`q` on stdin), then kills it if it lingers.
fn stop(child: &mut Child, program: &str) -> Result<(), RecordingError> {
    if let Some(mut stdin) = child.stdin.take() {
        // The encoder may already be gone; a broken pipe is fine here.
        let _ = stdin.write_all(b"q\n");
    }

    let deadline = Instant::now() + STOP_GRACE;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                log::debug!("Recorder exited with {}", status);
                return Ok(());
            }
            Ok(None) if Instant::now() < deadline => {
                std::thread::sleep(Duration::from_millis(100));
            }
            Ok(None) => {
                log::debug!("Recorder did not stop, killing PID {}", child.id());
                if let Err(e) = child.kill() {
                    log::warn!("Failed to kill recorder {}: {}", child.id(), e);
                }
                child.wait().ok();
                return Ok(());
            }
            Err(e) => return Err(RecordingError::CommandFailed(program.to_string(), e)),
        }
    }
}

impl PhraseRecorder for Recorder {
    fn record(&self, phrase: &str) -> anyhow::Result<String> {
        let output = self.record_with(phrase, || {
            println!("{}", t!("record.info.stop"));
            let mut line = String::new();
            io::stdin().read_line(&mut line).map(|_| ())
        })?;
        let name = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(sound_tag(&name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_placeholder_is_substituted() {
        let (program, args) = build_command(
            "ffmpeg -f pulse -i default -y {output}",
            Path::new("/tmp/rec/mint.mp3"),
        )
        .unwrap();
        assert_eq!(program, "ffmpeg");
        assert_eq!(args, vec!["-f", "pulse", "-i", "default", "-y", "/tmp/rec/mint.mp3"]);
    }

    #[test]
    fn test_quoted_arguments_stay_whole() {
        let (_, args) = build_command(r#"rec -i "audio=Mic (USB)" {output}"#, Path::new("o.mp3")).unwrap();
        assert_eq!(args, vec!["-i", "audio=Mic (USB)", "o.mp3"]);
    }

    #[test]
    fn test_malformed_templates_are_rejected() {
        assert!(matches!(build_command("  ", Path::new("o")), Err(RecordingError::EmptyCommand)));
        assert!(matches!(
            build_command("ffmpeg -i default", Path::new("o")),
            Err(RecordingError::MissingOutput(_))
        ));
        assert!(matches!(
            build_command("ffmpeg \"{output}", Path::new("o")),
            Err(RecordingError::CommandParse(_))
        ));
    }

    #[test]
    fn test_missing_program_is_reported_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Recorder::new(
            "cardsmith-surely-missing-encoder {output}",
            dir.path().to_path_buf(),
        );
        let result = recorder.record_with("mint", || panic!("must not wait"));
        assert!(matches!(result, Err(RecordingError::NotInstalled(_))));
    }

    #[test]
    fn test_output_names_are_safe() {
        let name = output_name("give up!");
        assert!(name.starts_with("give_up_-"));
        assert!(name.ends_with(".mp3"));
        assert!(output_name("  ").starts_with("recording-"));
    }
}
