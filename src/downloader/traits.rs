// Resolver and progress sink trait definitions

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{AuthContext, ContentDescriptor, FetchRequest, FetchResult, ProgressEvent};

/// Receives progress events synchronously, in emission order
pub trait ProgressEventHandler {
    fn on_event(&mut self, event: ProgressEvent);
}

impl<F: FnMut(ProgressEvent)> ProgressEventHandler for F {
    fn on_event(&mut self, event: ProgressEvent) {
        self(event)
    }
}

/// External media resolver (extraction, format negotiation, transcoding)
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Name of the resolver (for logging)
    fn name(&self) -> &'static str;

    /// Resolve metadata without downloading. An empty result is an error.
    async fn probe(&self, url: &str, auth: &AuthContext) -> Result<ContentDescriptor, DownloadError>;

    /// Download with live progress; per-item failures are reported in the result
    async fn fetch(
        &self,
        request: &FetchRequest,
        sink: &mut (dyn ProgressEventHandler + Send),
    ) -> Result<FetchResult, DownloadError>;
}
