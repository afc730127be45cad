// Downloader module - session pipeline around an external media resolver

pub mod backends;
pub mod diagnostics;
pub mod errors;
pub mod format;
pub mod models;
pub mod orchestrator;
pub mod palette;
pub mod progress;
pub mod quality;
pub mod summary;
pub mod tools;
pub mod traits;
pub mod utils;

pub use backends::{ResolverConfig, YtDlpResolver};
pub use diagnostics::BlockingReason;
pub use errors::DownloadError;
pub use models::{
    AuthContext, ContentDescriptor, FetchRequest, FetchResult, ItemPosition, ProgressEvent,
    SkippedItem,
};
pub use orchestrator::{Orchestrator, SessionConfig, SessionOutcome};
pub use palette::Palette;
pub use progress::ProgressThrottle;
pub use tools::{ToolManager, ToolStatus, ToolType};
pub use traits::{MediaResolver, ProgressEventHandler};
