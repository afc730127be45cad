// External tool discovery: yt-dlp (required) and ffmpeg (audio extraction)

use std::path::{Path, PathBuf};

use super::utils::run_output_with_timeout;

const VERSION_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version", // ffmpeg takes a single dash
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<PathBuf>,
    pub is_available: bool,
}

/// Result of the startup dependency check
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub ytdlp: ToolInfo,
    pub ffmpeg: ToolInfo,
}

#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    ytdlp_override: Option<PathBuf>,
    ffmpeg_override: Option<PathBuf>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit binary (path or name) instead of searching
    pub fn with_override(mut self, tool_type: ToolType, path: Option<PathBuf>) -> Self {
        match tool_type {
            ToolType::YtDlp => self.ytdlp_override = path,
            ToolType::Ffmpeg => self.ffmpeg_override = path,
        }
        self
    }

    pub async fn check_dependencies(&self) -> ToolStatus {
        ToolStatus {
            ytdlp: self.get_tool_info(ToolType::YtDlp).await,
            ffmpeg: self.get_tool_info(ToolType::Ffmpeg).await,
        }
    }

    pub async fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let path = self.locate(tool_type);
        let version = match &path {
            Some(p) => get_version(p, tool_type).await,
            None => None,
        };

        tracing::debug!(
            tool = tool_type.as_str(),
            path = ?path,
            version = ?version,
            "tool probe"
        );

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            is_available: version.is_some(),
            version,
            path,
        }
    }

    /// Override, then PATH, then common install locations
    pub fn locate(&self, tool_type: ToolType) -> Option<PathBuf> {
        let override_path = match tool_type {
            ToolType::YtDlp => self.ytdlp_override.as_deref(),
            ToolType::Ffmpeg => self.ffmpeg_override.as_deref(),
        };

        if let Some(path) = override_path {
            return resolve_override(path);
        }

        let binary_name = tool_type.as_str();
        if let Ok(path) = which::which(binary_name) {
            return Some(path);
        }

        let common_paths = [
            format!("/opt/homebrew/bin/{}", binary_name),
            format!("/usr/local/bin/{}", binary_name),
            format!("/usr/bin/{}", binary_name),
        ];

        common_paths
            .into_iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
    }
}

fn resolve_override(path: &Path) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }
    which::which(path).ok()
}

async fn get_version(path: &Path, tool_type: ToolType) -> Option<String> {
    match run_output_with_timeout(path, &[tool_type.version_arg()], VERSION_TIMEOUT_SECS).await {
        Ok(output) if output.status.success() => {
            let out = String::from_utf8_lossy(&output.stdout);
            // ffmpeg prints a banner; keep the first line only
            Some(out.lines().next().unwrap_or("").trim().to_string())
        }
        Ok(output) => {
            tracing::warn!(tool = tool_type.as_str(), status = %output.status, "version probe failed");
            None
        }
        Err(e) => {
            tracing::warn!(tool = tool_type.as_str(), error = %e, "version probe failed");
            None
        }
    }
}
