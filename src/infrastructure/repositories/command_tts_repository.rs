use super::tts_repository::TtsRepository;
use crate::domain::synthesis::SynthesisError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;
use uuid::Uuid;

const TEXT: &str = "{text}";
const LANGUAGE: &str = "{language}";
const OUTPUT: &str = "{output}";
const SPEAKER: &str = "{speaker}";

/// Local TTS engine run as a child process (piper, espeak-ng, an XTTS wrapper).
///
/// Arguments are a template. Without a `{text}` placeholder the text is written
/// to stdin; without an `{output}` placeholder the WAV is read from stdout.
#[derive(Debug)]
pub struct CommandTtsRepository {
    program: PathBuf,
    args: Vec<String>,
    speaker_wav: Option<PathBuf>,
    scratch_dir: PathBuf,
}

impl CommandTtsRepository {
    /// Resolve the program and check the speaker reference before accepting
    /// any request.
    pub fn load(
        program: &str,
        args: Vec<String>,
        speaker_wav: Option<PathBuf>,
        scratch_dir: PathBuf,
    ) -> Result<Self, SynthesisError> {
        let program = find_program(program).ok_or_else(|| {
            SynthesisError::BackendUnavailable(format!("TTS program '{}' not found", program))
        })?;

        if let Some(speaker) = &speaker_wav {
            if !speaker.is_file() {
                return Err(SynthesisError::BackendUnavailable(format!(
                    "speaker reference file not found at {}",
                    speaker.display()
                )));
            }
        }

        if args.iter().any(|arg| arg.contains(SPEAKER)) && speaker_wav.is_none() {
            return Err(SynthesisError::BackendUnavailable(
                "command uses {speaker} but no speaker reference is configured".to_string(),
            ));
        }

        tracing::info!(
            program = %program.display(),
            args = ?args,
            speaker_wav = ?speaker_wav,
            "Local TTS command loaded"
        );

        Ok(Self {
            program,
            args,
            speaker_wav,
            scratch_dir,
        })
    }

    fn render_args(&self, text: &str, language: &str, output: &Path) -> Vec<String> {
        let speaker = self
            .speaker_wav
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let output = output.display().to_string();

        self.args
            .iter()
            .map(|arg| {
                arg.replace(LANGUAGE, language)
                    .replace(OUTPUT, &output)
                    .replace(SPEAKER, &speaker)
                    // Text last, so placeholders inside the text stay literal
                    .replace(TEXT, text)
            })
            .collect()
    }

    fn text_via_stdin(&self) -> bool {
        !self.args.iter().any(|arg| arg.contains(TEXT))
    }

    fn audio_via_stdout(&self) -> bool {
        !self.args.iter().any(|arg| arg.contains(OUTPUT))
    }

    /// Run the engine once. Dropping the future kills the process.
    async fn run(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError> {
        let output_path = self
            .scratch_dir
            .join(format!("{}.cmd.wav", Uuid::new_v4()));
        let args = self.render_args(text, language, &output_path);

        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| {
                SynthesisError::SynthesisFailure(format!(
                    "failed to prepare scratch directory: {}",
                    e
                ))
            })?;

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(if self.text_via_stdin() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                SynthesisError::BackendUnavailable(format!(
                    "failed to start {}: {}",
                    self.program.display(),
                    e
                ))
            })?;

        debug!(pid = ?child.id(), "TTS process started");

        if let Some(mut stdin) = child.stdin.take() {
            // A process that exits early closes the pipe; its exit status decides
            let mut input = text.as_bytes().to_vec();
            input.push(b'\n');
            if let Err(e) = stdin.write_all(&input).await {
                debug!(error = %e, "TTS process did not read its input");
            }
        }

        let output = child.wait_with_output().await.map_err(|e| {
            SynthesisError::SynthesisFailure(format!("TTS process failed: {}", e))
        })?;

        if !output.status.success() {
            remove_scratch(&output_path).await;
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(
                status = %output.status,
                stderr = %stderr.trim(),
                "Local TTS command failed"
            );
            return Err(SynthesisError::SynthesisFailure(format!(
                "TTS command exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        if self.audio_via_stdout() {
            return Ok(output.stdout);
        }

        let audio = tokio::fs::read(&output_path).await.map_err(|e| {
            SynthesisError::SynthesisFailure(format!(
                "TTS command produced no output file: {}",
                e
            ))
        });
        remove_scratch(&output_path).await;
        audio
    }
}

#[async_trait]
impl TtsRepository for CommandTtsRepository {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>, SynthesisError> {
        let start_time = std::time::Instant::now();

        let audio = self.run(text, language).await?;

        tracing::info!(
            provider = "command",
            language = language,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.chars().count(),
            audio_size_bytes = audio.len(),
            "TTS synthesis completed"
        );

        Ok(audio)
    }
}

async fn remove_scratch(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "Failed to remove scratch file");
        }
    }
}

/// Resolve `program` the way a shell would: paths are taken as-is, bare
/// names are searched on `PATH`.
fn find_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    std::env::var_os("PATH").and_then(|paths| {
        std::env::split_paths(&paths)
            .map(|dir| dir.join(program))
            .find(|path| path.is_file())
    })
}
