// Rate-limited progress line renderer
//
// Sampling, not queueing: a `Downloading` event arriving within `interval` of
// the last rendered line is dropped. Completion lines are always written.

use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use super::format::{format_byte_size, format_duration, UNKNOWN};
use super::models::{ItemPosition, ProgressEvent};
use super::palette::Palette;
use super::traits::ProgressEventHandler;

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

const NAME_WIDTH: usize = 40;

/// Progress sink bound to one download session
pub struct ProgressThrottle<W: Write> {
    out: W,
    palette: Palette,
    interval: Duration,
    last_emit: Option<Instant>,
    item_prefix: String,
}

impl<W: Write> ProgressThrottle<W> {
    pub fn new(out: W, palette: Palette) -> Self {
        Self {
            out,
            palette,
            interval: DEFAULT_INTERVAL,
            last_emit: None,
            item_prefix: String::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Handle one event as if it arrived at `now`
    pub fn handle_at(&mut self, event: &ProgressEvent, now: Instant) {
        match event {
            ProgressEvent::Downloading {
                downloaded_bytes,
                total_bytes,
                speed_bytes_per_sec,
                eta_seconds,
                item_label,
                position,
            } => {
                if let Some(last) = self.last_emit {
                    if now.saturating_duration_since(last) < self.interval {
                        return;
                    }
                }
                self.last_emit = Some(now);

                if let Some(ItemPosition { index, count }) = position {
                    self.item_prefix = format!("[{}/{}] ", index, count);
                }

                let line = format!(
                    "{}⬇️  {} | {}/{} @ {} | {} | {}",
                    self.item_prefix,
                    percent(*downloaded_bytes, *total_bytes),
                    format_byte_size(Some(*downloaded_bytes)),
                    format_byte_size(*total_bytes),
                    speed(*speed_bytes_per_sec),
                    eta(*eta_seconds),
                    short_name(item_label),
                );
                let _ = write!(self.out, "\r{}", self.palette.cyan(&line));
                let _ = self.out.flush();
            }
            ProgressEvent::Finished { file_path } => {
                let name = file_path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "file".to_string());
                let line = format!("✅ {}Completed: {}", self.item_prefix, name);
                let _ = writeln!(self.out, "\n{}", self.palette.green(&line));
                let _ = self.out.flush();
            }
            // Failures are collected by the resolver and summarized at the end
            ProgressEvent::Errored { .. } => {}
        }
    }
}

impl<W: Write> ProgressEventHandler for ProgressThrottle<W> {
    fn on_event(&mut self, event: ProgressEvent) {
        self.handle_at(&event, Instant::now());
    }
}

fn percent(downloaded: f64, total: Option<f64>) -> String {
    match total {
        Some(t) if t.is_finite() && t > 0.0 && downloaded.is_finite() => {
            format!("{:5.1}%", downloaded / t * 100.0)
        }
        _ => "---.-%".to_string(),
    }
}

fn speed(bytes_per_sec: Option<f64>) -> String {
    match bytes_per_sec {
        Some(s) if s > 0.0 => format!("{}/s", format_byte_size(Some(s))),
        _ => UNKNOWN.to_string(),
    }
}

fn eta(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s > 0.0 => format!("ETA: {}", format_duration(Some(s))),
        _ => String::new(),
    }
}

fn short_name(label: &str) -> String {
    let name = Path::new(label)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "...".to_string());
    name.chars().take(NAME_WIDTH).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn downloading(downloaded: f64, total: Option<f64>) -> ProgressEvent {
        ProgressEvent::Downloading {
            downloaded_bytes: downloaded,
            total_bytes: total,
            speed_bytes_per_sec: Some(2048.0),
            eta_seconds: Some(65.0),
            item_label: "/tmp/out/My Clip [abc].mp4.part".to_string(),
            position: None,
        }
    }

    fn output(throttle: ProgressThrottle<Vec<u8>>) -> String {
        String::from_utf8(throttle.into_inner()).unwrap()
    }

    #[test]
    fn test_events_100ms_apart_emit_once() {
        let mut throttle = ProgressThrottle::new(Vec::new(), Palette::plain());
        let t0 = Instant::now();

        throttle.handle_at(&downloading(10.0, Some(100.0)), t0);
        throttle.handle_at(&downloading(20.0, Some(100.0)), t0 + Duration::from_millis(100));

        assert_eq!(output(throttle).matches('\r').count(), 1);
    }

    #[test]
    fn test_events_600ms_apart_emit_twice() {
        let mut throttle = ProgressThrottle::new(Vec::new(), Palette::plain());
        let t0 = Instant::now();

        throttle.handle_at(&downloading(10.0, Some(100.0)), t0);
        throttle.handle_at(&downloading(20.0, Some(100.0)), t0 + Duration::from_millis(600));

        let text = output(throttle);
        assert_eq!(text.matches('\r').count(), 2);
        assert!(text.contains(" 20.0%"));
    }

    #[test]
    fn test_custom_interval() {
        let mut throttle = ProgressThrottle::new(Vec::new(), Palette::plain())
            .with_interval(Duration::from_millis(50));
        let t0 = Instant::now();

        throttle.handle_at(&downloading(10.0, Some(100.0)), t0);
        throttle.handle_at(&downloading(20.0, Some(100.0)), t0 + Duration::from_millis(30));
        throttle.handle_at(&downloading(30.0, Some(100.0)), t0 + Duration::from_millis(60));

        let text = output(throttle);
        assert_eq!(text.matches('\r').count(), 2);
        assert!(!text.contains(" 20.0%"));
        assert!(text.contains(" 30.0%"));
    }

    #[test]
    fn test_finished_is_never_throttled() {
        let mut throttle = ProgressThrottle::new(Vec::new(), Palette::plain());
        let t0 = Instant::now();

        throttle.handle_at(&downloading(10.0, Some(100.0)), t0);
        throttle.handle_at(
            &ProgressEvent::Finished {
                file_path: PathBuf::from("/tmp/out/My Clip [abc].mp4"),
            },
            t0 + Duration::from_millis(1),
        );

        let text = output(throttle);
        assert!(text.contains("✅ Completed: My Clip [abc].mp4"));
    }

    #[test]
    fn test_status_line_layout() {
        let mut throttle = ProgressThrottle::new(Vec::new(), Palette::plain());
        throttle.handle_at(&downloading(1536.0, Some(3072.0)), Instant::now());

        assert_eq!(
            output(throttle),
            "\r⬇️   50.0% | 1.5 KB/3.0 KB @ 2.0 KB/s | ETA: 01:05 | My Clip [abc].mp4.part"
        );
    }

    #[test]
    fn test_unknown_fields_degrade_to_placeholders() {
        let mut throttle = ProgressThrottle::new(Vec::new(), Palette::plain());
        let event = ProgressEvent::Downloading {
            downloaded_bytes: 0.0,
            total_bytes: Some(0.0),
            speed_bytes_per_sec: None,
            eta_seconds: None,
            item_label: String::new(),
            position: None,
        };
        throttle.handle_at(&event, Instant::now());

        let text = output(throttle);
        assert!(text.contains("---.-%"));
        assert!(text.contains("N/A/N/A @ N/A"));
    }

    #[test]
    fn test_collection_prefix_carries_to_completion() {
        let mut throttle = ProgressThrottle::new(Vec::new(), Palette::plain());
        let t0 = Instant::now();

        let event = ProgressEvent::Downloading {
            downloaded_bytes: 5.0,
            total_bytes: None,
            speed_bytes_per_sec: None,
            eta_seconds: None,
            item_label: "002 - Song.webm".to_string(),
            position: Some(ItemPosition { index: 2, count: 7 }),
        };
        throttle.handle_at(&event, t0);
        throttle.handle_at(
            &ProgressEvent::Finished {
                file_path: PathBuf::from("Mix/002 - Song.webm"),
            },
            t0,
        );

        let text = output(throttle);
        assert!(text.starts_with("\r[2/7] ⬇️"));
        assert!(text.contains("✅ [2/7] Completed: 002 - Song.webm"));
    }

    #[test]
    fn test_errored_is_silent() {
        let mut throttle = ProgressThrottle::new(Vec::new(), Palette::plain());
        throttle.on_event(ProgressEvent::Errored {
            message: "HTTP Error 403".to_string(),
        });
        assert!(output(throttle).is_empty());
    }

    #[test]
    fn test_long_names_are_truncated() {
        assert_eq!(short_name(&"a".repeat(80)).chars().count(), NAME_WIDTH);
    }
}
