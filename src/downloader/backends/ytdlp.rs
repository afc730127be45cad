// yt-dlp resolver - drives the native `yt-dlp` binary
//
// Probe uses `--dump-single-json --flat-playlist` so collections resolve
// without touching every entry. Fetch asks yt-dlp for a machine-readable
// progress template and a completion marker, then turns each output line
// into a `ProgressEvent` for the sink.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command as TokioCommand;
use tokio::sync::mpsc;

use crate::downloader::errors::DownloadError;
use crate::downloader::models::{
    AuthContext, ContentDescriptor, FetchRequest, FetchResult, ItemPosition, ProgressEvent,
    SkippedItem,
};
use crate::downloader::quality::{AUDIO_CODEC, AUDIO_QUALITY};
use crate::downloader::traits::{MediaResolver, ProgressEventHandler};
use crate::downloader::utils::run_output_with_timeout;

pub const PROGRESS_TAG: &str = "tubeget:progress";
pub const DONE_TAG: &str = "tubeget:done";

/// Tunables passed straight through to yt-dlp
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub ytdlp_path: PathBuf,
    /// Handed to yt-dlp as `--ffmpeg-location` when set
    pub ffmpeg_path: Option<PathBuf>,
    pub socket_timeout: u32,
    pub retries: u32,
    pub fragment_retries: u32,
    /// Upper bound for the metadata probe
    pub probe_timeout_secs: u64,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: PathBuf::from("yt-dlp"),
            ffmpeg_path: None,
            socket_timeout: 30,
            retries: 10,
            fragment_retries: 10,
            probe_timeout_secs: 120,
            proxy: None,
        }
    }
}

impl ResolverConfig {
    pub fn with_ytdlp_path(mut self, path: PathBuf) -> Self {
        self.ytdlp_path = path;
        self
    }

    pub fn with_ffmpeg_path(mut self, path: Option<PathBuf>) -> Self {
        self.ffmpeg_path = path;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_socket_timeout(mut self, seconds: u32) -> Self {
        self.socket_timeout = seconds;
        self
    }

    pub fn with_retries(mut self, retries: u32, fragment_retries: u32) -> Self {
        self.retries = retries;
        self.fragment_retries = fragment_retries;
        self
    }

    fn network_args(&self) -> Vec<String> {
        let mut args = vec!["--socket-timeout".to_string(), self.socket_timeout.to_string()];

        if let Some(proxy) = &self.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args
    }
}

pub struct YtDlpResolver {
    config: ResolverConfig,
}

impl YtDlpResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    fn probe_args(&self, url: &str, auth: &AuthContext) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--flat-playlist".to_string(),
            "--skip-download".to_string(),
            "--ignore-errors".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(self.config.network_args());
        args.extend(auth_args(auth));
        args.push(url.to_string());
        args
    }

    fn fetch_args(&self, request: &FetchRequest) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            request.quality.format_spec.to_string(),
            "-o".to_string(),
            request.output_template.clone(),
            "--newline".to_string(),
            "--progress".to_string(),
            "--no-simulate".to_string(),
            "--ignore-errors".to_string(),
            "--retries".to_string(),
            self.config.retries.to_string(),
            "--fragment-retries".to_string(),
            self.config.fragment_retries.to_string(),
            "--no-check-certificates".to_string(),
            // Avoids permission errors on some filesystems
            "--no-mtime".to_string(),
            "--progress-template".to_string(),
            progress_template(),
            "--print".to_string(),
            format!("after_move:{}|%(filepath)s", DONE_TAG),
        ];
        args.extend(self.config.network_args());

        if let Some(max) = request.max_items {
            args.push("--playlist-end".to_string());
            args.push(max.to_string());
        }

        args.extend(auth_args(&request.auth));

        if let Some(ffmpeg) = &self.config.ffmpeg_path {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.to_string_lossy().into_owned());
        }

        if request.quality.is_audio() {
            args.extend([
                "-x".to_string(),
                "--audio-format".to_string(),
                AUDIO_CODEC.to_string(),
                "--audio-quality".to_string(),
                AUDIO_QUALITY.to_string(),
            ]);
        }

        args.push(request.url.clone());
        args
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn probe(&self, url: &str, auth: &AuthContext) -> Result<ContentDescriptor, DownloadError> {
        let args = self.probe_args(url, auth);
        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        tracing::debug!(program = %self.config.ytdlp_path.display(), args = ?args, "probe");

        let output = run_output_with_timeout(
            &self.config.ytdlp_path,
            &arg_refs,
            self.config.probe_timeout_secs,
        )
        .await?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let body = stdout.trim();

        if body.is_empty() || body == "null" {
            if let Some(line) = stderr.lines().find(|l| is_error_line(l)) {
                return Err(DownloadError::resolution(line.trim()));
            }
            if !output.status.success() && !stderr.trim().is_empty() {
                return Err(DownloadError::from(stderr.trim().to_string()));
            }
            return Err(DownloadError::no_content());
        }

        // With --ignore-errors some entries may fail; the rest still resolve
        for line in stderr.lines().filter(|l| is_error_line(l)) {
            tracing::warn!(line = line.trim(), "probe reported an entry error");
        }

        let raw: RawInfo = serde_json::from_str(body)?;
        raw.into_descriptor().ok_or_else(DownloadError::no_content)
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        sink: &mut (dyn ProgressEventHandler + Send),
    ) -> Result<FetchResult, DownloadError> {
        let args = self.fetch_args(request);
        tracing::info!(
            program = %self.config.ytdlp_path.display(),
            format = request.quality.format_spec,
            "starting yt-dlp download"
        );
        tracing::debug!(args = ?args, "fetch");

        let mut child = TokioCommand::new(&self.config.ytdlp_path)
            .args(&args)
            .env("PYTHONIOENCODING", "UTF-8")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DownloadError::ExecutionError(format!("Failed to start yt-dlp: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| DownloadError::ExecutionError("Failed to capture stderr".to_string()))?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let stdout_task = tokio::spawn(forward_lines(stdout, tx.clone()));
        let stderr_task = tokio::spawn(forward_lines(stderr, tx));

        let mut skipped = Vec::new();
        while let Some(line) = rx.recv().await {
            match parse_line(&line) {
                Some(ProgressEvent::Errored { message }) => {
                    tracing::warn!(message = %message, "item failed");
                    skipped.push(SkippedItem::from_message(message.clone()));
                    sink.on_event(ProgressEvent::Errored { message });
                }
                Some(event) => sink.on_event(event),
                None => {
                    let line = line.trim();
                    if !line.is_empty() {
                        tracing::debug!(line, "yt-dlp");
                    }
                }
            }
        }

        let _ = stdout_task.await;
        let _ = stderr_task.await;

        let status = child
            .wait()
            .await
            .map_err(|e| DownloadError::ExecutionError(format!("Process error: {}", e)))?;

        if !status.success() && skipped.is_empty() {
            skipped.push(SkippedItem::from_message(format!("yt-dlp exited with {}", status)));
        }

        tracing::info!(
            success = status.success(),
            skipped = skipped.len(),
            "yt-dlp finished"
        );

        Ok(FetchResult {
            succeeded: status.success(),
            skipped,
        })
    }
}

fn auth_args(auth: &AuthContext) -> Vec<String> {
    match &auth.cookies_from_browser {
        Some(browser) => vec!["--cookies-from-browser".to_string(), browser.clone()],
        None => Vec::new(),
    }
}

fn progress_template() -> String {
    format!(
        "download:{}|%(progress.status)s|%(progress.downloaded_bytes)s|%(progress.total_bytes)s\
         |%(progress.total_bytes_estimate)s|%(progress.speed)s|%(progress.eta)s\
         |%(info.playlist_index)s|%(info.playlist_count)s|%(progress.filename)s",
        PROGRESS_TAG
    )
}

/// Read a pipe line by line (lossy UTF-8) into the shared channel
async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim_end_matches(['\r', '\n']).to_string();
                if tx.send(line).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read yt-dlp output");
                break;
            }
        }
    }
}

fn is_error_line(line: &str) -> bool {
    line.trim_start().starts_with("ERROR:")
}

/// Parse one line of yt-dlp output into a progress event
pub fn parse_line(line: &str) -> Option<ProgressEvent> {
    if let Some(rest) = line.trim_start().strip_prefix(PROGRESS_TAG) {
        return parse_template_progress(rest.strip_prefix('|')?);
    }

    if let Some(rest) = line.trim_start().strip_prefix(DONE_TAG) {
        let path = rest.strip_prefix('|')?.trim();
        if path.is_empty() || path == "NA" {
            return None;
        }
        return Some(ProgressEvent::Finished {
            file_path: PathBuf::from(path),
        });
    }

    if is_error_line(line) {
        return Some(ProgressEvent::Errored {
            message: line.trim().to_string(),
        });
    }

    parse_classic_progress(line)
}

fn parse_template_progress(fields: &str) -> Option<ProgressEvent> {
    let parts: Vec<&str> = fields.splitn(9, '|').collect();
    if parts.len() != 9 || parts[0].trim() != "downloading" {
        return None;
    }

    let position = match (number(parts[6]), number(parts[7])) {
        (Some(index), Some(count)) if index >= 1.0 && count >= 1.0 => Some(ItemPosition {
            index: index as u32,
            count: count as u32,
        }),
        _ => None,
    };

    Some(ProgressEvent::Downloading {
        downloaded_bytes: number(parts[1]).unwrap_or(0.0),
        total_bytes: number(parts[2]).or_else(|| number(parts[3])),
        speed_bytes_per_sec: number(parts[4]),
        eta_seconds: number(parts[5]),
        item_label: parts[8].trim().to_string(),
        position,
    })
}

/// Fallback for the stock line: `[download]  12.5% of ~ 10.00MiB at 1.00MiB/s ETA 00:05`
fn parse_classic_progress(line: &str) -> Option<ProgressEvent> {
    lazy_static::lazy_static! {
        static ref PROGRESS_RE: Regex = Regex::new(
            r"\[download\]\s+(\d+\.?\d*)%\s+of\s+~?\s*(\d+\.?\d*\s*\w+)(?:\s+at\s+(\d+\.?\d*\s*\w+)/s)?(?:\s+ETA\s+(\S+))?"
        ).unwrap();
    }

    let caps = PROGRESS_RE.captures(line)?;
    let percent: f64 = caps.get(1)?.as_str().parse().ok()?;
    let total = caps.get(2).and_then(|m| parse_size(m.as_str()));

    Some(ProgressEvent::Downloading {
        downloaded_bytes: total.map_or(0.0, |t| t * percent / 100.0),
        total_bytes: total,
        speed_bytes_per_sec: caps.get(3).and_then(|m| parse_size(m.as_str())),
        eta_seconds: caps.get(4).and_then(|m| parse_clock(m.as_str())),
        item_label: String::new(),
        position: None,
    })
}

/// Template field as a number; yt-dlp writes `NA` for missing values
fn number(field: &str) -> Option<f64> {
    field.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `10.00MiB` -> bytes
fn parse_size(text: &str) -> Option<f64> {
    lazy_static::lazy_static! {
        static ref SIZE_RE: Regex = Regex::new(r"^(\d+(?:\.\d+)?)\s*([KMGT]?)(i?)B$").unwrap();
    }

    let caps = SIZE_RE.captures(text.trim())?;
    let value: f64 = caps.get(1)?.as_str().parse().ok()?;
    let base: f64 = if caps.get(3).map_or("", |m| m.as_str()) == "i" {
        1024.0
    } else {
        1000.0
    };
    let exp = match caps.get(2).map_or("", |m| m.as_str()) {
        "K" => 1,
        "M" => 2,
        "G" => 3,
        "T" => 4,
        _ => 0,
    };
    Some(value * base.powi(exp))
}

/// `mm:ss` or `hh:mm:ss` -> seconds
fn parse_clock(text: &str) -> Option<f64> {
    let mut seconds = 0.0;
    for part in text.split(':') {
        let n: u32 = part.parse().ok()?;
        seconds = seconds * 60.0 + f64::from(n);
    }
    Some(seconds)
}

/// Subset of the yt-dlp info dict needed for the summary
#[derive(Debug, Deserialize)]
struct RawInfo {
    #[serde(rename = "_type")]
    kind: Option<String>,
    title: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
    entries: Option<Vec<Option<serde_json::Value>>>,
}

impl RawInfo {
    /// `None` when the URL resolved to an empty collection
    fn into_descriptor(self) -> Option<ContentDescriptor> {
        let creator = self.uploader.or(self.channel);
        let valid_entries = self
            .entries
            .as_ref()
            .map(|entries| entries.iter().flatten().count());

        if valid_entries == Some(0) {
            return None;
        }

        let is_collection = matches!(self.kind.as_deref(), Some("playlist" | "multi_video"));

        if is_collection {
            Some(ContentDescriptor::Collection {
                title: self.title.unwrap_or_else(|| "Unknown Playlist".to_string()),
                creator: creator.unwrap_or_else(|| "Unknown Creator".to_string()),
                item_count: valid_entries.unwrap_or(0),
            })
        } else {
            Some(ContentDescriptor::SingleItem {
                title: self.title.unwrap_or_else(|| "Unknown Video".to_string()),
                creator: creator.unwrap_or_else(|| "Unknown Channel".to_string()),
                duration_seconds: self.duration,
            })
        }
    }
}
