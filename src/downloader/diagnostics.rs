// Failure diagnostics - classifies resolver error text
//
// yt-dlp reports per-item failures as free text on stderr. This module maps
// that text onto a reason code so the end-of-session summary can tell
// retryable problems (throttling, timeouts) from dead ends (private, DRM).

/// Why an item could not be resolved or fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingReason {
    /// Resolver returned no downloadable entries
    NoContent,

    /// HTTP 403 Forbidden - general access denied
    Http403Forbidden,

    /// Age-restricted content requiring login
    AgeRestricted,

    /// Geographic restriction
    GeoBlocked,

    /// Network timeout or connection failure
    NetworkTimeout,

    /// Rate limiting (429 or similar)
    RateLimited,

    /// Bot detection triggered
    BotDetection,

    /// Private video requiring authorization
    PrivateVideo,

    /// Video deleted or unavailable
    VideoUnavailable,

    /// DRM-protected content (Premium, Music, Movies)
    DrmProtected,

    /// Member-only content (requires channel membership)
    MembersOnly,

    /// Generic/unknown failure
    Unknown,
}

impl BlockingReason {
    /// Likely to succeed on a later attempt without changing anything
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden | Self::NetworkTimeout | Self::RateLimited | Self::BotDetection
        )
    }

    /// Retrying with the same access will not help
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::NoContent
                | Self::AgeRestricted
                | Self::GeoBlocked
                | Self::PrivateVideo
                | Self::VideoUnavailable
                | Self::DrmProtected
                | Self::MembersOnly
        )
    }

    /// Check if cookies might help
    pub fn cookies_might_help(&self) -> bool {
        matches!(
            self,
            Self::Http403Forbidden
                | Self::AgeRestricted
                | Self::BotDetection
                | Self::PrivateVideo
                | Self::MembersOnly
        )
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::NoContent => "No valid videos found",
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::AgeRestricted => "Age-restricted content",
            Self::GeoBlocked => "Geographic restriction",
            Self::NetworkTimeout => "Network timeout",
            Self::RateLimited => "Rate limited",
            Self::BotDetection => "Bot detection triggered",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::DrmProtected => "DRM-protected content",
            Self::MembersOnly => "Members-only content",
            Self::Unknown => "Unknown error",
        }
    }

    /// Short hint printed under a failure
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::NoContent => Some("The content may be private or deleted."),
            Self::Http403Forbidden | Self::BotDetection => {
                Some("Try --cookies-from-browser <browser> to reuse a logged-in session.")
            }
            Self::AgeRestricted | Self::PrivateVideo | Self::MembersOnly => {
                Some("Use --cookies-from-browser with an account that has access.")
            }
            Self::GeoBlocked => Some("Try a VPN or proxy located in an allowed region."),
            Self::RateLimited => Some("Wait 10-15 minutes before trying again."),
            Self::NetworkTimeout => Some("Check your internet connection and try again."),
            Self::DrmProtected => Some("DRM-protected media cannot be downloaded as a file."),
            Self::VideoUnavailable | Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for BlockingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Analyze error message and return blocking reason
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    let lower = error.to_lowercase();

    // Check patterns in order of specificity

    if lower.contains("drm")
        || lower.contains("widevine")
        || lower.contains("encrypted media")
        || lower.contains("youtube premium")
        || lower.contains("requires purchase")
        || lower.contains("rental")
        || lower.contains("requires payment")
    {
        return Some(BlockingReason::DrmProtected);
    }

    if lower.contains("members only")
        || lower.contains("members-only")
        || lower.contains("join this channel")
        || lower.contains("available to members")
    {
        return Some(BlockingReason::MembersOnly);
    }

    if lower.contains("age-restricted")
        || lower.contains("confirm your age")
        || lower.contains("age_verification")
    {
        return Some(BlockingReason::AgeRestricted);
    }

    if lower.contains("private video")
        || lower.contains("video is private")
        || lower.contains("been granted access")
    {
        return Some(BlockingReason::PrivateVideo);
    }

    // yt-dlp prefixes geo blocks with "Video unavailable."
    if lower.contains("available in your country")
        || lower.contains("from your location")
        || lower.contains("blocked in your country")
        || lower.contains("geo restrict")
        || lower.contains("geo-restrict")
    {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("video unavailable")
        || lower.contains("has been removed")
        || lower.contains("no longer available")
        || lower.contains("is unavailable")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("429") || lower.contains("rate limit") || lower.contains("too many requests") {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("not a bot")
        || lower.contains("captcha")
        || lower.contains("unusual traffic")
    {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("connection reset")
        || lower.contains("network unreachable")
        || lower.contains("temporary failure in name resolution")
    {
        return Some(BlockingReason::NetworkTimeout);
    }

    if !error.trim().is_empty() {
        return Some(BlockingReason::Unknown);
    }

    None
}
