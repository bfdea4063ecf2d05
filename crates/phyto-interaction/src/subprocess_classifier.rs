//! SubprocessClassifier - runs the classification engine as a child process.
//!
//! Each call stages the image under a unique transient path, spawns the
//! engine with `<image path> <model path>` appended to the configured
//! command, and waits for it under a hard deadline. The engine prints one
//! JSON record on stdout and exits 0.

use async_trait::async_trait;
use phyto_core::classification::{
    ClassificationError, ClassificationInvoker, ClassificationResult, ImagePayload,
    MAX_IMAGE_BYTES, parse_engine_output,
};
use phyto_core::config::ClassifierConfig;
use phyto_core::{PhytoError, Result};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;

use crate::transient::ClassificationRequest;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Classification backend that spawns one engine process per request.
///
/// Holds configuration only; no state is shared between calls.
#[derive(Debug, Clone)]
pub struct SubprocessClassifier {
    program: String,
    leading_args: Vec<String>,
    model_path: PathBuf,
    working_dir: Option<PathBuf>,
    scratch_dir: PathBuf,
    timeout: Duration,
    max_image_bytes: usize,
}

struct EngineOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl SubprocessClassifier {
    /// Creates a classifier for `command` (program plus leading arguments).
    pub fn new(command: Vec<String>, model_path: impl Into<PathBuf>) -> Result<Self> {
        let mut parts = command.into_iter();
        let program = parts
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| PhytoError::config("classification engine command is empty"))?;

        Ok(Self {
            program,
            leading_args: parts.collect(),
            model_path: model_path.into(),
            working_dir: None,
            scratch_dir: std::env::temp_dir(),
            timeout: DEFAULT_TIMEOUT,
            max_image_bytes: MAX_IMAGE_BYTES,
        })
    }

    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        let mut classifier = Self::new(config.command.clone(), config.model_path.clone())?
            .with_timeout(config.timeout())
            .with_max_image_bytes(config.max_image_bytes);
        if let Some(dir) = &config.working_dir {
            classifier = classifier.with_working_dir(dir.clone());
        }
        if let Some(dir) = &config.scratch_dir {
            classifier = classifier.with_scratch_dir(dir.clone());
        }
        Ok(classifier)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    pub fn with_max_image_bytes(mut self, limit: usize) -> Self {
        self.max_image_bytes = limit;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn check_payload(&self, image: &ImagePayload) -> std::result::Result<(), ClassificationError> {
        if image.is_empty() {
            return Err(ClassificationError::invalid_input("No image provided"));
        }
        if image.len() > self.max_image_bytes {
            return Err(ClassificationError::invalid_input(format!(
                "Image is {} bytes; the limit is {} bytes",
                image.len(),
                self.max_image_bytes
            )));
        }
        Ok(())
    }

    /// Runs the engine against a staged request, killing it on timeout.
    async fn run_engine(
        &self,
        request: &ClassificationRequest,
    ) -> std::result::Result<EngineOutput, ClassificationError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .arg(request.path())
            .arg(&self.model_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            tracing::error!(
                request_id = %request.id(),
                program = %self.program,
                error = %e,
                "Failed to spawn classification engine"
            );
            ClassificationError::engine_failure(
                None,
                format!("Failed to spawn '{}': {}", self.program, e),
            )
        })?;

        let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
            ClassificationError::engine_failure(None, "engine stdout was not captured")
        })?;
        let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
            ClassificationError::engine_failure(None, "engine stderr was not captured")
        })?;

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();

        let waited = tokio::time::timeout(self.timeout, async {
            let (read_out, read_err, status) = tokio::join!(
                stdout_pipe.read_to_end(&mut stdout),
                stderr_pipe.read_to_end(&mut stderr),
                child.wait()
            );
            read_out?;
            read_err?;
            status
        })
        .await;

        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                if let Err(kill_err) = child.kill().await {
                    tracing::warn!(request_id = %request.id(), error = %kill_err, "Failed to kill engine");
                }
                return Err(ClassificationError::engine_failure(
                    None,
                    format!("Failed to collect engine output: {e}"),
                ));
            }
            Err(_) => {
                tracing::warn!(
                    request_id = %request.id(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Classification engine timed out, killing"
                );
                // kill() also reaps the child, so nothing is left behind.
                if let Err(kill_err) = child.kill().await {
                    tracing::warn!(request_id = %request.id(), error = %kill_err, "Failed to kill engine");
                }
                return Err(ClassificationError::Timeout {
                    budget: self.timeout,
                });
            }
        };

        Ok(EngineOutput {
            status,
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }
}

#[async_trait]
impl ClassificationInvoker for SubprocessClassifier {
    async fn classify(
        &self,
        image: ImagePayload,
    ) -> std::result::Result<ClassificationResult, ClassificationError> {
        self.check_payload(&image)?;

        let request = ClassificationRequest::stage(&image, &self.scratch_dir).await?;
        let started = Instant::now();

        tracing::info!(
            request_id = %request.id(),
            bytes = request.size(),
            "Classification started"
        );

        let outcome = self.run_engine(&request).await.and_then(|output| {
            if !output.status.success() {
                let diagnostics = if output.stderr.trim().is_empty() {
                    output.stdout.trim()
                } else {
                    output.stderr.trim()
                };
                tracing::error!(
                    request_id = %request.id(),
                    status = %output.status,
                    stderr = %diagnostics,
                    "Classification engine failed"
                );
                return Err(ClassificationError::engine_failure(
                    output.status.code(),
                    diagnostics,
                ));
            }
            if !output.stderr.trim().is_empty() {
                tracing::debug!(request_id = %request.id(), stderr = %output.stderr.trim(), "Engine diagnostics");
            }
            parse_engine_output(&output.stdout)
        });

        let request_id = request.id();
        request.release();

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &outcome {
            Ok(result) => tracing::info!(
                request_id = %request_id,
                elapsed_ms,
                label = %result.label(),
                confidence = result.confidence().value(),
                "Classification completed"
            ),
            Err(ClassificationError::MalformedOutput { reason, raw }) => tracing::error!(
                request_id = %request_id,
                elapsed_ms,
                reason = %reason,
                raw = %raw,
                "Classification engine produced malformed output"
            ),
            Err(e) => tracing::warn!(
                request_id = %request_id,
                elapsed_ms,
                error = %e,
                "Classification failed"
            ),
        }

        outcome
    }

    fn name(&self) -> &str {
        "subprocess"
    }
}
