//! Sandboxed code execution. The isolation itself is the container's job; this side only pipes code in and
//! collects stdout/stderr under a hard timeout.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, instrument};

pub const SANDBOX_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    Shell,
    JavaScript,
}

impl Language {
    /// Accepts the canonical names and common aliases; anything else is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => Some(Language::Python),
            "shell" | "sh" | "bash" => Some(Language::Shell),
            "javascript" | "js" | "node" | "nodejs" => Some(Language::JavaScript),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Shell => "shell",
            Language::JavaScript => "javascript",
        }
    }

    /// Interpreter invocation reading the program from stdin.
    fn interpreter(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["python3", "-"],
            Language::Shell => &["sh", "-s"],
            Language::JavaScript => &["node", "-"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl SandboxOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("sandbox unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait Sandbox: Send + Sync {
    async fn execute(&self, language: Language, code: &str, timeout: Duration) -> Result<SandboxOutput, SandboxError>;
}

/// Exit status of a process killed by `timeout -s KILL`.
const KILLED_BY_DEADLINE: i32 = 137;
/// Extra time the local client waits past the in-container deadline.
const CLIENT_GRACE: Duration = Duration::from_secs(2);

/// Runs code inside a long-lived container via `docker exec -i <container>`. The deadline is enforced inside the
/// container by `timeout -s KILL`, since killing the local client leaves the exec'd process running.
#[derive(Debug, Clone)]
pub struct DockerSandbox {
    container: String,
}

impl DockerSandbox {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
        }
    }

    fn exec_args(&self, language: Language, timeout: Duration) -> Vec<String> {
        let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        let mut args = vec![
            "exec".to_string(),
            "-i".to_string(),
            self.container.clone(),
            "timeout".to_string(),
            "-s".to_string(),
            "KILL".to_string(),
            secs.max(1).to_string(),
        ];
        args.extend(language.interpreter().iter().map(|a| a.to_string()));
        args
    }
}

#[async_trait]
impl Sandbox for DockerSandbox {
    #[instrument(skip(self, code), fields(container = %self.container, language = language.as_str()))]
    async fn execute(&self, language: Language, code: &str, timeout: Duration) -> Result<SandboxOutput, SandboxError> {
        let mut child = Command::new("docker")
            .args(self.exec_args(language, timeout))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| SandboxError::Unavailable(e.to_string()))?;

        // stdin is fed while output is drained so a chatty program cannot fill its pipe and stall.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(code.as_bytes()).await {
                    debug!(error = %e, "Program stopped reading its input");
                }
            }
        };
        let run = async {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output.map_err(|e| SandboxError::Unavailable(e.to_string()))
        };

        let output = tokio::time::timeout(timeout + CLIENT_GRACE, run)
            .await
            .map_err(|_| SandboxError::Timeout(timeout))??;

        let exit_code = output.status.code();
        debug!(status = ?exit_code, "Sandbox run finished");
        if exit_code == Some(KILLED_BY_DEADLINE) {
            return Err(SandboxError::Timeout(timeout));
        }
        Ok(SandboxOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code,
        })
    }
}
