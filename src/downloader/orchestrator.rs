// Download session: tool check, probe, summary, quality prompt, fetch, report

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Instant;

use super::errors::DownloadError;
use super::format::format_duration;
use super::models::{AuthContext, FetchRequest, FetchResult};
use super::palette::Palette;
use super::progress::ProgressThrottle;
use super::quality::{available_presets, prompt_quality, QualityPreset};
use super::summary::render_summary;
use super::tools::ToolStatus;
use super::traits::MediaResolver;
use super::utils::{build_output_template, ensure_output_dir};

/// Per-run settings coming from the command line
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub url: String,
    pub output_dir: PathBuf,
    pub max_items: Option<u32>,
    pub auth: AuthContext,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Completed(FetchResult),
    /// User quit at the quality prompt
    Cancelled,
}

pub struct Orchestrator<R: MediaResolver> {
    resolver: R,
    tools: ToolStatus,
    palette: Palette,
}

impl<R: MediaResolver> Orchestrator<R> {
    pub fn new(resolver: R, tools: ToolStatus, palette: Palette) -> Self {
        Self {
            resolver,
            tools,
            palette,
        }
    }

    pub fn into_resolver(self) -> R {
        self.resolver
    }

    /// Run one session against caller-supplied terminal streams
    pub async fn run<I, O>(
        &self,
        config: &SessionConfig,
        input: &mut I,
        output: &mut O,
    ) -> Result<SessionOutcome, DownloadError>
    where
        I: BufRead + Send,
        O: Write + Send,
    {
        match self.prepare(config, input, output).await? {
            Some(request) => Ok(SessionOutcome::Completed(self.execute(&request, output).await?)),
            None => Ok(SessionOutcome::Cancelled),
        }
    }

    /// Tool check, probe, summary and quality prompt. `None` means the user quit.
    ///
    /// This is the only stage that reads `input`; no child process outlives it.
    pub async fn prepare<I, O>(
        &self,
        config: &SessionConfig,
        input: &mut I,
        output: &mut O,
    ) -> Result<Option<FetchRequest>, DownloadError>
    where
        I: BufRead + Send,
        O: Write + Send,
    {
        let has_ffmpeg = self.check_tools(output)?;

        writeln!(output, "{}", self.palette.blue("🔍 Analyzing URL..."))?;
        tracing::info!(url = %config.url, resolver = self.resolver.name(), "probing content");

        let content = self.resolver.probe(&config.url, &config.auth).await?;
        tracing::info!(title = content.title(), collection = content.is_collection(), "content resolved");
        writeln!(output, "{}", render_summary(&content, &self.palette))?;

        let presets = available_presets(has_ffmpeg);
        let quality = match prompt_quality(&presets, input, output, &self.palette)? {
            Some(preset) => preset,
            None => {
                tracing::info!("session cancelled at quality prompt");
                writeln!(output, "{}", self.palette.yellow("👋 Goodbye!"))?;
                return Ok(None);
            }
        };

        require_ffmpeg_for(&quality, has_ffmpeg)?;

        let output_dir = ensure_output_dir(&config.output_dir).await?;
        writeln!(
            output,
            "\n{} {}",
            self.palette.blue("📁 Saving to:"),
            output_dir.display()
        )?;

        Ok(Some(FetchRequest {
            url: config.url.clone(),
            quality,
            output_template: build_output_template(&output_dir, &content),
            max_items: config.max_items,
            auth: config.auth.clone(),
        }))
    }

    /// Download with the throttled progress line, then print the report
    pub async fn execute<O>(
        &self,
        request: &FetchRequest,
        output: &mut O,
    ) -> Result<FetchResult, DownloadError>
    where
        O: Write + Send,
    {
        writeln!(output, "{}\n", self.palette.blue("🚀 Starting download..."))?;
        tracing::info!(
            template = %request.output_template,
            format = request.quality.format_spec,
            max_items = ?request.max_items,
            "starting fetch"
        );

        let started = Instant::now();
        let result = {
            let mut throttle = ProgressThrottle::new(&mut *output, self.palette);
            self.resolver.fetch(request, &mut throttle).await?
        };
        let elapsed = started.elapsed().as_secs_f64();

        self.report(
            output,
            &result,
            elapsed,
            request.auth.cookies_from_browser.is_some(),
        )?;
        tracing::info!(
            elapsed_secs = elapsed,
            skipped = result.skipped_count(),
            succeeded = result.succeeded,
            "session finished"
        );

        Ok(result)
    }

    /// Returns whether ffmpeg is usable
    fn check_tools<O: Write>(&self, output: &mut O) -> Result<bool, DownloadError> {
        let ytdlp = &self.tools.ytdlp;
        if !ytdlp.is_available {
            return Err(DownloadError::ToolNotFound(
                "yt-dlp is not installed or not in PATH".to_string(),
            ));
        }
        writeln!(
            output,
            "{}",
            self.palette.green(&format!(
                "✅ yt-dlp {}",
                ytdlp.version.as_deref().unwrap_or("(unknown version)")
            ))
        )?;

        let ffmpeg = &self.tools.ffmpeg;
        if !ffmpeg.is_available {
            tracing::warn!("ffmpeg not found, audio extraction disabled");
            writeln!(
                output,
                "{}",
                self.palette
                    .yellow("⚠️  ffmpeg not found: audio-only downloads are unavailable")
            )?;
        }

        Ok(ffmpeg.is_available)
    }

    fn report<O: Write>(
        &self,
        output: &mut O,
        result: &FetchResult,
        elapsed: f64,
        cookies_configured: bool,
    ) -> Result<(), DownloadError> {
        writeln!(output)?;

        if result.has_failures() {
            let mut counts = format!(
                "{} transient, {} permanent",
                result.transient_count(),
                result.permanent_count()
            );
            if result.other_count() > 0 {
                counts.push_str(&format!(", {} other", result.other_count()));
            }
            writeln!(
                output,
                "{}",
                self.palette.yellow(&format!(
                    "⚠️  Finished with problems: {} item(s) skipped ({})",
                    result.skipped_count(),
                    counts
                ))
            )?;
            if result.transient_count() > 0 {
                writeln!(output, "   Transient failures may succeed on a later run.")?;
            }

            // Cookie advice is noise once a browser profile is already in use
            let hint = result
                .skipped
                .iter()
                .map(|item| item.reason)
                .filter(|reason| !(cookies_configured && reason.cookies_might_help()))
                .find_map(|reason| reason.suggestion());
            if let Some(hint) = hint {
                writeln!(output, "   💡 {}", hint)?;
            }
        } else {
            writeln!(output, "{}", self.palette.green("🎉 All downloads finished!"))?;
        }

        writeln!(
            output,
            "{} {}",
            self.palette.blue("⏱️ Total time:"),
            format_duration(Some(elapsed))
        )?;
        Ok(())
    }
}

/// Audio extraction needs ffmpeg even when the preset did not come from the menu
fn require_ffmpeg_for(quality: &QualityPreset, has_ffmpeg: bool) -> Result<(), DownloadError> {
    if quality.is_audio() && !has_ffmpeg {
        return Err(DownloadError::ToolNotFound(
            "ffmpeg is required for audio extraction".to_string(),
        ));
    }
    Ok(())
}
