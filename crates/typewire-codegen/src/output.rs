//! Formatting and persisting artifacts.

use crate::artifact::Artifact;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use typewire_core::{GenError, GenResult};

/// Deadline for one formatter run unless configured otherwise
pub const DEFAULT_FORMATTER_TIMEOUT: Duration = Duration::from_secs(30);

/// Cosmetic pass over generated text
pub trait Formatter {
    /// Return the formatted text, or a description of why formatting failed
    fn format(&self, file_name: &str, contents: &str) -> Result<String, String>;
}

/// Pipes text through an external command.
///
/// The artifact's file name is appended as the last argument, so tools like
/// `prettier --stdin-filepath` can pick a parser. A command that runs past
/// its deadline is killed and reported as a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFormatter {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandFormatter {
    /// Returns `None` for an empty command
    pub fn new(argv: Vec<String>) -> Option<Self> {
        (!argv.is_empty()).then_some(Self {
            argv,
            timeout: DEFAULT_FORMATTER_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, file_name: &str, contents: &str) -> Result<String, String> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| "formatter command is empty".to_string())?;

        let mut child = Command::new(program)
            .args(args)
            .arg(file_name)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("failed to start `{program}`: {e}"))?;

        // Every pipe gets its own thread so a formatter that fills stdout
        // before draining stdin cannot deadlock.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "formatter stdin unavailable".to_string())?;
        let input = contents.to_string();
        let writer = std::thread::spawn(move || stdin.write_all(input.as_bytes()));
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_with_deadline(&mut child, self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                // Pipe threads are left to finish on their own once the
                // child is gone
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!(
                    "`{program}` did not finish within {} ms and was killed",
                    self.timeout.as_millis()
                ));
            }
            Err(e) => {
                let _ = child.kill();
                return Err(format!("`{program}` did not finish: {e}"));
            }
        };

        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(format!("failed to write to `{program}`: {e}")),
            Err(_) => return Err(format!("writer thread for `{program}` panicked")),
        }
        let stdout = collect(stdout, program)?;
        let stderr = collect(stderr, program)?;

        if !status.success() {
            let stderr = String::from_utf8_lossy(&stderr);
            return Err(format!(
                "`{program}` exited with {:?}: {}",
                status.code(),
                stderr.trim()
            ));
        }
        let formatted = String::from_utf8(stdout)
            .map_err(|_| format!("`{program}` produced invalid UTF-8"))?;
        if formatted.trim().is_empty() {
            return Err(format!("`{program}` produced no output"));
        }
        Ok(formatted)
    }
}

/// Read a child pipe to the end on a separate thread
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn collect(handle: JoinHandle<Vec<u8>>, program: &str) -> Result<Vec<u8>, String> {
    handle
        .join()
        .map_err(|_| format!("reader thread for `{program}` panicked"))
}

/// Poll the child until it exits; `None` once the deadline has passed
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Run the formatter over every artifact.
///
/// An artifact whose formatting fails keeps its original text.
pub fn format_artifacts(artifacts: Vec<Artifact>, formatter: &dyn Formatter) -> Vec<Artifact> {
    artifacts
        .into_iter()
        .map(|artifact| match formatter.format(&artifact.file_name, &artifact.contents) {
            Ok(contents) => Artifact::new(artifact.file_name, contents),
            Err(reason) => {
                tracing::warn!(
                    file = %artifact.file_name,
                    reason = %reason,
                    "formatter failed; keeping unformatted output"
                );
                artifact
            }
        })
        .collect()
}

/// Write artifacts into `dir`.
///
/// Every artifact goes to a temporary file first; targets are replaced only
/// after all temporary files were written. On failure the temporary files
/// are removed and existing targets stay untouched.
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> GenResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .map_err(|e| GenError::Io(format!("failed to create {}: {e}", dir.display())))?;

    let mut staged = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let target = dir.join(&artifact.file_name);
        let temp = dir.join(format!(".{}.typewire.tmp", artifact.file_name));
        if let Err(e) = std::fs::write(&temp, &artifact.contents) {
            let _ = std::fs::remove_file(&temp);
            remove_all(&staged);
            return Err(GenError::Io(format!(
                "failed to write {}: {e}",
                target.display()
            )));
        }
        staged.push((temp, target));
    }

    let mut written = Vec::with_capacity(staged.len());
    for (i, (temp, target)) in staged.iter().enumerate() {
        if let Err(e) = std::fs::rename(temp, target) {
            remove_all(&staged[i..]);
            return Err(GenError::Io(format!(
                "failed to replace {}: {e}",
                target.display()
            )));
        }
        tracing::debug!(path = %target.display(), "wrote artifact");
        written.push(target.clone());
    }

    Ok(written)
}

fn remove_all(staged: &[(PathBuf, PathBuf)]) {
    for (temp, _) in staged {
        let _ = std::fs::remove_file(temp);
    }
}
