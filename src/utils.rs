// Subprocess helpers shared by the provider and the combiner

use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

use crate::errors::DownloadError;

/// Run a command to completion with piped output, killing it after
/// `timeout_secs`.
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, DownloadError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| DownloadError::Execution(format!("Failed to start {}: {}", program, e)))?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        DownloadError::Execution(format!("Failed to capture stdout from {}", program))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        DownloadError::Execution(format!("Failed to capture stderr from {}", program))
    })?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    let waited = timeout(Duration::from_secs(timeout_secs), child.wait()).await;
    match waited {
        Ok(status_res) => {
            let status = status_res.map_err(|e| {
                DownloadError::Execution(format!("Failed to wait for {}: {}", program, e))
            })?;
            let stdout = stdout_task
                .await
                .map_err(|e| DownloadError::Execution(format!("stdout task failed: {}", e)))?
                .map_err(|e| DownloadError::Execution(format!("Failed to read stdout: {}", e)))?;
            let stderr = stderr_task
                .await
                .map_err(|e| DownloadError::Execution(format!("stderr task failed: {}", e)))?
                .map_err(|e| DownloadError::Execution(format!("Failed to read stderr: {}", e)))?;
            Ok(std::process::Output {
                status,
                stdout,
                stderr,
            })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(DownloadError::Execution(format!(
                "{} timed out after {}s",
                program, timeout_secs
            )))
        }
    }
}

/// Run a command to completion with piped output and no deadline. Merge
/// jobs can legitimately run for a long time.
pub async fn run_output(
    program: &str,
    args: Vec<String>,
) -> Result<std::process::Output, DownloadError> {
    TokioCommand::new(program)
        .args(&args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| DownloadError::Execution(format!("Failed to run {}: {}", program, e)))
}

/// Locate a binary in common install paths, then PATH via `which`, falling
/// back to the bare name.
pub fn find_binary(name: &str) -> String {
    let common_paths = vec![
        format!("/opt/homebrew/bin/{}", name),
        format!("/usr/local/bin/{}", name),
        format!("/usr/bin/{}", name),
    ];

    for path in common_paths {
        if std::path::Path::new(&path).exists() {
            return path;
        }
    }

    if let Ok(output) = std::process::Command::new("which").arg(name).output() {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    name.to_string()
}
