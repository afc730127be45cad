// Human-readable byte sizes and durations for terminal output

/// Placeholder for unknown or non-positive values
pub const UNKNOWN: &str = "N/A";

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count, e.g. 1536 -> "1.5 KB"
pub fn format_byte_size(bytes: Option<f64>) -> String {
    let mut size = match bytes {
        Some(b) if b.is_finite() && b > 0.0 => b,
        _ => return UNKNOWN.to_string(),
    };

    let mut unit = 0;
    while size >= 1024.0 && unit < SIZE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    format!("{:.1} {}", size, SIZE_UNITS[unit])
}

/// Format seconds as `mm:ss`, or `hh:mm:ss` once an hour is reached
pub fn format_duration(seconds: Option<f64>) -> String {
    let total = match seconds {
        Some(s) if s.is_finite() && s > 0.0 => s as u64,
        _ => return UNKNOWN.to_string(),
    };

    let h = total / 3600;
    let m = (total % 3600) / 60;
    let s = total % 60;

    if h > 0 {
        format!("{:02}:{:02}:{:02}", h, m, s)
    } else {
        format!("{:02}:{:02}", m, s)
    }
}
