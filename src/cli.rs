//! Command-line arguments and their conversion into session settings.

use clap::Parser;
use std::path::PathBuf;

use crate::downloader::{
    AuthContext, DownloadError, ResolverConfig, SessionConfig, ToolManager, ToolStatus, ToolType,
};

const DOWNLOAD_DIR_NAME: &str = "YouTube_Downloads";

/// Download videos, playlists and audio with yt-dlp
#[derive(Parser, Debug, Clone)]
#[command(name = "tubeget", version, about)]
pub struct Args {
    /// Video or playlist URL
    #[arg(short, long)]
    pub url: String,

    /// Output directory (default: <Downloads>/YouTube_Downloads)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Stop after this many playlist items
    #[arg(long, value_name = "N")]
    pub max_downloads: Option<u32>,

    /// Load cookies from a browser profile (chrome, firefox, safari, ...)
    #[arg(long, value_name = "BROWSER")]
    pub cookies_from_browser: Option<String>,

    /// Route yt-dlp traffic through a proxy (e.g. socks5://127.0.0.1:1080)
    #[arg(long, value_name = "URL", env = "TUBEGET_PROXY")]
    pub proxy: Option<String>,

    /// Write debug-level entries to the log file
    #[arg(long)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Log file location
    #[arg(long, value_name = "PATH", default_value = "tubeget.log")]
    pub log_file: PathBuf,

    /// yt-dlp binary to use instead of searching PATH
    #[arg(long, value_name = "PATH", env = "TUBEGET_YTDLP")]
    pub ytdlp: Option<PathBuf>,

    /// ffmpeg binary to use instead of searching PATH
    #[arg(long, value_name = "PATH", env = "TUBEGET_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,
}

impl Args {
    pub fn tool_manager(&self) -> ToolManager {
        ToolManager::new()
            .with_override(ToolType::YtDlp, self.ytdlp.clone())
            .with_override(ToolType::Ffmpeg, self.ffmpeg.clone())
    }

    /// Resolver settings pointing at the binaries the probe actually found
    pub fn resolver_config(&self, tools: &ToolStatus) -> ResolverConfig {
        let mut config = ResolverConfig::default().with_proxy(self.proxy.clone());

        if let Some(path) = &tools.ytdlp.path {
            config = config.with_ytdlp_path(path.clone());
        }
        if tools.ffmpeg.is_available {
            config = config.with_ffmpeg_path(tools.ffmpeg.path.clone());
        }

        config
    }
}

impl TryFrom<&Args> for SessionConfig {
    type Error = DownloadError;

    fn try_from(args: &Args) -> Result<Self, Self::Error> {
        let url = args.url.trim();
        if url.is_empty() {
            return Err(DownloadError::InvalidInput("URL must not be empty".to_string()));
        }

        if args.max_downloads == Some(0) {
            return Err(DownloadError::InvalidInput(
                "--max-downloads must be at least 1".to_string(),
            ));
        }

        let cookies = args
            .cookies_from_browser
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .map(str::to_string);

        Ok(Self {
            url: url.to_string(),
            output_dir: args.output.clone().unwrap_or_else(default_output_dir),
            max_items: args.max_downloads,
            auth: AuthContext::default().with_cookies_from_browser(cookies),
        })
    }
}

/// Platform download directory, or the working directory when there is none
pub fn default_output_dir() -> PathBuf {
    dirs::download_dir()
        .map(|dir| dir.join(DOWNLOAD_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(DOWNLOAD_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::tools::ToolInfo;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["tubeget", "-u", "https://youtu.be/abc"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert!(!args.debug);
        assert!(!args.no_color);
        assert_eq!(args.log_file, PathBuf::from("tubeget.log"));

        let config = SessionConfig::try_from(&args).unwrap();
        assert_eq!(config.url, "https://youtu.be/abc");
        assert_eq!(config.max_items, None);
        assert_eq!(config.auth, AuthContext::default());
        assert!(config.output_dir.ends_with(DOWNLOAD_DIR_NAME));
    }

    #[test]
    fn test_full_flags() {
        let args = parse(&[
            "-o",
            "/tmp/media",
            "--max-downloads",
            "5",
            "--cookies-from-browser",
            "firefox",
            "--debug",
            "--no-color",
        ]);
        let config = SessionConfig::try_from(&args).unwrap();

        assert_eq!(config.output_dir, PathBuf::from("/tmp/media"));
        assert_eq!(config.max_items, Some(5));
        assert_eq!(config.auth.cookies_from_browser.as_deref(), Some("firefox"));
        assert!(args.debug);
        assert!(args.no_color);
    }

    #[test]
    fn test_zero_max_downloads_rejected() {
        let args = parse(&["--max-downloads", "0"]);
        let err = SessionConfig::try_from(&args).unwrap_err();
        assert!(matches!(err, DownloadError::InvalidInput(_)));
    }

    #[test]
    fn test_blank_url_rejected() {
        let args = Args::try_parse_from(["tubeget", "--url", "  "]).unwrap();
        assert!(SessionConfig::try_from(&args).is_err());
    }

    #[test]
    fn test_url_is_required() {
        assert!(Args::try_parse_from(["tubeget"]).is_err());
    }

    #[test]
    fn test_resolver_config_uses_located_tools() {
        let args = parse(&["--proxy", "socks5://127.0.0.1:1080"]);
        let tools = ToolStatus {
            ytdlp: ToolInfo {
                name: "yt-dlp".to_string(),
                tool_type: ToolType::YtDlp,
                version: Some("2024.01.01".to_string()),
                path: Some(PathBuf::from("/opt/bin/yt-dlp")),
                is_available: true,
            },
            ffmpeg: ToolInfo {
                name: "ffmpeg".to_string(),
                tool_type: ToolType::Ffmpeg,
                version: None,
                path: None,
                is_available: false,
            },
        };
        let config = args.resolver_config(&tools);

        assert_eq!(config.ytdlp_path, PathBuf::from("/opt/bin/yt-dlp"));
        assert_eq!(config.ffmpeg_path, None);
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
    }
}
