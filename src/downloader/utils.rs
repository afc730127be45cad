// Helper functions shared by the resolver and the orchestrator

use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

use super::errors::DownloadError;
use super::models::ContentDescriptor;

const COLLECTION_DIR_WIDTH: usize = 60;
const COLLECTION_DIR_FALLBACK: &str = "YouTube Playlist";

/// Run command with timeout, capturing stdout and stderr
pub async fn run_output_with_timeout(
    program: &Path,
    args: &[&str],
    timeout_secs: u64,
) -> Result<std::process::Output, DownloadError> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| {
            DownloadError::ExecutionError(format!("Failed to start {}: {}", program.display(), e))
        })?;

    let mut stdout_pipe = child
        .stdout
        .take()
        .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stdout".to_string()))?;
    let mut stderr_pipe = child
        .stderr
        .take()
        .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stderr".to_string()))?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status) => {
            let status = status?;
            let stdout = join_pipe(stdout_task).await?;
            let stderr = join_pipe(stderr_task).await?;
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
            Err(DownloadError::ExecutionError(format!(
                "{} timed out after {}s",
                program.display(),
                timeout_secs
            )))
        }
    }
}

async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
) -> Result<Vec<u8>, DownloadError> {
    task.await
        .map_err(|e| DownloadError::ExecutionError(format!("pipe reader failed: {}", e)))?
        .map_err(DownloadError::from)
}

/// Make a collection title safe to use as a directory name
pub fn sanitize_title(title: &str) -> String {
    lazy_static::lazy_static! {
        static ref RESERVED_RE: Regex = Regex::new(r#"[<>:"/\\|?*]"#).unwrap();
    }

    let cleaned: String = RESERVED_RE
        .replace_all(title, "_")
        .chars()
        .take(COLLECTION_DIR_WIDTH)
        .collect();

    if cleaned.trim().is_empty() {
        COLLECTION_DIR_FALLBACK.to_string()
    } else {
        cleaned
    }
}

/// yt-dlp output template; collections nest under their sanitized title
pub fn build_output_template(output_dir: &Path, content: &ContentDescriptor) -> String {
    let path = match content {
        ContentDescriptor::Collection { title, .. } => output_dir
            .join(sanitize_title(title))
            .join("%(playlist_index)03d - %(title)s [%(id)s].%(ext)s"),
        ContentDescriptor::SingleItem { .. } => output_dir.join("%(title)s [%(id)s].%(ext)s"),
    };
    path.to_string_lossy().into_owned()
}

/// Create the output directory and return its absolute form for display
pub async fn ensure_output_dir(output_dir: &Path) -> Result<PathBuf, DownloadError> {
    tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
        DownloadError::Io(format!("cannot create {}: {}", output_dir.display(), e))
    })?;
    Ok(tokio::fs::canonicalize(output_dir)
        .await
        .unwrap_or_else(|_| output_dir.to_path_buf()))
}
