// Content summary shown before the quality prompt

use super::format::format_duration;
use super::models::ContentDescriptor;
use super::palette::Palette;

/// Multi-line description of resolved content; the caller prints it
pub fn render_summary(content: &ContentDescriptor, palette: &Palette) -> String {
    let mut lines = vec![format!("\n{}", palette.bold("📊 Content Information:"))];

    match content {
        ContentDescriptor::Collection {
            title,
            creator,
            item_count,
        } => {
            lines.push(format!("   📋 Type:    {}", palette.cyan("Playlist")));
            lines.push(format!("   📋 Title:   {}", palette.cyan(title)));
            lines.push(format!("   👤 Creator: {}", palette.green(creator)));
            lines.push(format!("   🎬 Videos:  {}", palette.yellow(&item_count.to_string())));
        }
        ContentDescriptor::SingleItem {
            title,
            creator,
            duration_seconds,
        } => {
            lines.push(format!("   🎬 Type:     {}", palette.cyan("Single Video")));
            lines.push(format!("   📺 Title:    {}", palette.cyan(title)));
            lines.push(format!("   👤 Channel:  {}", palette.green(creator)));
            lines.push(format!(
                "   ⏱️ Duration: {}",
                palette.yellow(&format_duration(*duration_seconds))
            ));
        }
    }

    lines.join("\n")
}
