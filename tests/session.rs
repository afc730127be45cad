use async_trait::async_trait;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Mutex;

use tubeget::downloader::tools::ToolInfo;
use tubeget::downloader::{
    AuthContext, BlockingReason, ContentDescriptor, DownloadError, FetchRequest, FetchResult,
    MediaResolver, Orchestrator, Palette, ProgressEvent, ProgressEventHandler, SessionConfig,
    SessionOutcome, SkippedItem, ToolStatus, ToolType,
};

/// Replays canned events instead of running yt-dlp
struct FakeResolver {
    content: Result<ContentDescriptor, DownloadError>,
    events: Vec<ProgressEvent>,
    skipped: Vec<SkippedItem>,
    requests: Mutex<Vec<FetchRequest>>,
}

impl FakeResolver {
    fn new(content: ContentDescriptor, events: Vec<ProgressEvent>) -> Self {
        Self {
            content: Ok(content),
            events,
            skipped: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn failing(error: DownloadError) -> Self {
        Self {
            content: Err(error),
            events: Vec::new(),
            skipped: Vec::new(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl MediaResolver for FakeResolver {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn probe(&self, _url: &str, _auth: &AuthContext) -> Result<ContentDescriptor, DownloadError> {
        self.content.clone()
    }

    async fn fetch(
        &self,
        request: &FetchRequest,
        sink: &mut (dyn ProgressEventHandler + Send),
    ) -> Result<FetchResult, DownloadError> {
        self.requests.lock().unwrap().push(request.clone());
        for event in &self.events {
            sink.on_event(event.clone());
        }
        Ok(FetchResult {
            succeeded: self.skipped.is_empty(),
            skipped: self.skipped.clone(),
        })
    }
}

fn tools(ffmpeg: bool) -> ToolStatus {
    let info = |tool_type: ToolType, available: bool| ToolInfo {
        name: tool_type.as_str().to_string(),
        tool_type,
        version: available.then(|| "test".to_string()),
        path: available.then(|| PathBuf::from(tool_type.as_str())),
        is_available: available,
    };
    ToolStatus {
        ytdlp: info(ToolType::YtDlp, true),
        ffmpeg: info(ToolType::Ffmpeg, ffmpeg),
    }
}

fn config(output_dir: PathBuf) -> SessionConfig {
    SessionConfig {
        url: "https://www.youtube.com/watch?v=abc".to_string(),
        output_dir,
        max_items: None,
        auth: AuthContext::default(),
    }
}

fn single_item() -> ContentDescriptor {
    ContentDescriptor::SingleItem {
        title: "Test Clip".to_string(),
        creator: "Test Channel".to_string(),
        duration_seconds: Some(125.0),
    }
}

fn downloading(downloaded: f64) -> ProgressEvent {
    ProgressEvent::Downloading {
        downloaded_bytes: downloaded,
        total_bytes: Some(10_000.0),
        speed_bytes_per_sec: Some(1024.0),
        eta_seconds: Some(5.0),
        item_label: "Test Clip [abc].mp4.part".to_string(),
        position: None,
    }
}

async fn run_session(
    resolver: FakeResolver,
    ffmpeg: bool,
    input: &str,
) -> (Result<SessionOutcome, DownloadError>, String, FakeResolver) {
    let tmp = tempfile::tempdir().unwrap();
    let orchestrator = Orchestrator::new(resolver, tools(ffmpeg), Palette::plain());
    let mut output = Vec::new();

    let outcome = orchestrator
        .run(&config(tmp.path().join("out")), &mut Cursor::new(input.to_string()), &mut output)
        .await;

    (outcome, String::from_utf8(output).unwrap(), orchestrator.into_resolver())
}

#[tokio::test]
async fn test_single_item_end_to_end() {
    let mut events: Vec<ProgressEvent> = (1..=10).map(|i| downloading(i as f64 * 1000.0)).collect();
    events.push(ProgressEvent::Finished {
        file_path: PathBuf::from("/out/Test Clip [abc].mp4"),
    });

    let (outcome, text, resolver) = run_session(FakeResolver::new(single_item(), events), true, "1\n").await;

    assert!(matches!(outcome, Ok(SessionOutcome::Completed(ref r)) if !r.has_failures()));
    assert!(text.contains("Single Video"));
    assert!(text.contains("Test Clip"));
    assert!(text.contains("02:05"));
    assert_eq!(text.matches('\r').count(), 1);
    assert_eq!(text.matches("Completed: Test Clip [abc].mp4").count(), 1);
    assert!(text.contains("All downloads finished!"));

    let requests = resolver.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].quality.key, "1");
    assert!(requests[0].output_template.ends_with("%(title)s [%(id)s].%(ext)s"));
}

#[tokio::test]
async fn test_collection_uses_playlist_directory() {
    let content = ContentDescriptor::Collection {
        title: "Road/Trip: Mix".to_string(),
        creator: "DJ".to_string(),
        item_count: 3,
    };

    let (outcome, text, resolver) = run_session(FakeResolver::new(content, Vec::new()), true, "4\n").await;

    assert!(outcome.is_ok());
    assert!(text.contains("Videos:  3"));

    let requests = resolver.requests.lock().unwrap();
    assert!(requests[0].quality.is_audio());
    assert!(requests[0].output_template.contains("Road_Trip_ Mix"));
    assert!(requests[0].output_template.contains("%(playlist_index)03d"));
}

#[tokio::test]
async fn test_quit_cancels_without_fetch() {
    let (outcome, text, resolver) =
        run_session(FakeResolver::new(single_item(), Vec::new()), true, "q\n").await;

    assert_eq!(outcome.unwrap(), SessionOutcome::Cancelled);
    assert!(text.contains("Goodbye"));
    assert!(resolver.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_resolution_error_propagates() {
    let resolver = FakeResolver::failing(DownloadError::no_content());
    let (outcome, text, resolver) = run_session(resolver, true, "1\n").await;

    let err = outcome.unwrap_err();
    assert!(matches!(
        err,
        DownloadError::Resolution {
            reason: BlockingReason::NoContent,
            ..
        }
    ));
    assert_ne!(err.exit_code(), 0);
    assert!(!text.contains("Select Download Quality"));
    assert!(resolver.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_skipped_items_are_summarized() {
    let mut resolver = FakeResolver::new(single_item(), Vec::new());
    resolver.skipped = vec![
        SkippedItem::from_message("ERROR: [youtube] a: HTTP Error 429: Too Many Requests"),
        SkippedItem::from_message("ERROR: [youtube] b: Private video"),
    ];

    let (outcome, text, _) = run_session(resolver, false, "2\n").await;

    match outcome {
        Ok(SessionOutcome::Completed(result)) => assert_eq!(result.skipped_count(), 2),
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert!(text.contains("2 item(s) skipped (1 transient, 1 permanent)"));
}
