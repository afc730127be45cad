// Common data models for downloader

use std::path::PathBuf;

use super::diagnostics::BlockingReason;
use super::quality::QualityPreset;

/// What a URL resolves to, produced once by the resolver's probe
#[derive(Debug, Clone, PartialEq)]
pub enum ContentDescriptor {
    SingleItem {
        title: String,
        creator: String,
        duration_seconds: Option<f64>,
    },
    Collection {
        title: String,
        creator: String,
        item_count: usize,
    },
}

impl ContentDescriptor {
    pub fn title(&self) -> &str {
        match self {
            Self::SingleItem { title, .. } | Self::Collection { title, .. } => title,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::Collection { .. })
    }
}

/// Position of an item inside a collection download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemPosition {
    pub index: u32,
    pub count: u32,
}

/// Progress signal emitted by a resolver while fetching
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Downloading {
        downloaded_bytes: f64,
        total_bytes: Option<f64>,
        speed_bytes_per_sec: Option<f64>,
        eta_seconds: Option<f64>,
        /// File currently being written
        item_label: String,
        position: Option<ItemPosition>,
    },
    Finished {
        file_path: PathBuf,
    },
    Errored {
        message: String,
    },
}

/// Authentication passed through to the resolver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    /// Browser name to load cookies from (chrome, firefox, ...)
    pub cookies_from_browser: Option<String>,
}

impl AuthContext {
    pub fn with_cookies_from_browser(mut self, browser: Option<String>) -> Self {
        self.cookies_from_browser = browser;
        self
    }
}

/// Everything a resolver needs for one fetch
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub quality: QualityPreset,
    /// yt-dlp `%(field)s` output template
    pub output_template: String,
    pub max_items: Option<u32>,
    pub auth: AuthContext,
}

/// An item the resolver gave up on
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedItem {
    pub message: String,
    pub reason: BlockingReason,
}

impl SkippedItem {
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let reason = super::diagnostics::diagnose_error(&message).unwrap_or(BlockingReason::Unknown);
        Self { message, reason }
    }
}

/// Outcome of a fetch session; per-item failures land in `skipped`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    pub succeeded: bool,
    pub skipped: Vec<SkippedItem>,
}

impl FetchResult {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn transient_count(&self) -> usize {
        self.skipped.iter().filter(|s| s.reason.is_transient()).count()
    }

    pub fn permanent_count(&self) -> usize {
        self.skipped.iter().filter(|s| s.reason.is_permanent()).count()
    }

    /// Skipped items that are neither transient nor permanent
    pub fn other_count(&self) -> usize {
        self.skipped_count() - self.transient_count() - self.permanent_count()
    }

    pub fn has_failures(&self) -> bool {
        !self.succeeded || !self.skipped.is_empty()
    }
}
