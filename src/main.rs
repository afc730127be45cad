use clap::Parser;
use std::io::{self, BufReader};
use std::sync::Arc;
use std::time::Duration;

use tubeget::cli::Args;
use tubeget::downloader::{DownloadError, Orchestrator, Palette, SessionConfig, YtDlpResolver};
use tubeget::logging;

/// Grace period for an aborted fetch to reap yt-dlp
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let guard = logging::init(&args.log_file, args.debug)?;
    let palette = Palette::detect(args.no_color);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "tubeget starting");
    let code = run(args, palette).await;
    tracing::info!(code, "exiting");

    drop(guard);
    std::process::exit(code);
}

async fn run(args: Args, palette: Palette) -> i32 {
    println!("{}", palette.bold("🎬 tubeget - YouTube downloader"));

    let config = match SessionConfig::try_from(&args) {
        Ok(config) => config,
        Err(e) => return report_error(&e, palette),
    };

    let tools = args.tool_manager().check_dependencies().await;
    let resolver = YtDlpResolver::new(args.resolver_config(&tools));
    let orchestrator = Arc::new(Orchestrator::new(resolver, tools, palette));

    // The prompt blocks on stdin, which abort() cannot interrupt; nothing
    // needs reaping at this stage, so Ctrl-C exits right away.
    let mut prepare = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            let mut input = BufReader::new(io::stdin());
            let mut output = io::stdout();
            orchestrator.prepare(&config, &mut input, &mut output).await
        })
    };

    let request = tokio::select! {
        joined = &mut prepare => match joined {
            Ok(Ok(Some(request))) => request,
            Ok(Ok(None)) => return 0,
            Ok(Err(e)) => return report_error(&e, palette),
            Err(e) => return report_join_error(&e, palette),
        },
        _ = tokio::signal::ctrl_c() => {
            prepare.abort();
            return interrupted(palette);
        }
    };

    let mut fetch = tokio::spawn(async move {
        let mut output = io::stdout();
        orchestrator.execute(&request, &mut output).await
    });

    tokio::select! {
        joined = &mut fetch => match joined {
            Ok(Ok(result)) => {
                if result.has_failures() {
                    tracing::warn!(skipped = result.skipped_count(), "finished with skipped items");
                }
                0
            }
            Ok(Err(e)) => report_error(&e, palette),
            Err(e) => report_join_error(&e, palette),
        },
        _ = tokio::signal::ctrl_c() => {
            fetch.abort();
            // Dropping the fetch future kills the yt-dlp child
            let _ = tokio::time::timeout(SHUTDOWN_GRACE, fetch).await;
            interrupted(palette)
        }
    }
}

fn interrupted(palette: Palette) -> i32 {
    tracing::info!("interrupted by user");
    println!("\n{}", palette.yellow("👋 Download interrupted. Goodbye!"));
    0
}

fn report_join_error(error: &tokio::task::JoinError, palette: Palette) -> i32 {
    tracing::error!(error = %error, "session task failed");
    eprintln!("{}", palette.red(&format!("❌ Internal error: {}", error)));
    70
}

fn report_error(error: &DownloadError, palette: Palette) -> i32 {
    tracing::error!(error = %error, code = error.exit_code(), "session failed");
    eprintln!("\n{}", palette.red(&format!("❌ {}", error)));

    match error {
        DownloadError::Resolution { reason, .. } => {
            if let Some(hint) = reason.suggestion().filter(|h| !error.to_string().contains(h)) {
                eprintln!("   💡 {}", hint);
            }
        }
        DownloadError::ToolNotFound(_) => {
            eprintln!("   💡 Install yt-dlp (and ffmpeg for audio), or point --ytdlp/--ffmpeg at them.");
        }
        _ => {}
    }

    error.exit_code()
}
