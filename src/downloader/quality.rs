// Quality presets and the interactive picker
//
// The menu is fixed; yt-dlp interprets the format specs. Choice parsing is a
// pure function so the prompt loop only shuffles lines between the caller's
// reader and writer.

use std::io::{self, BufRead, Write};

use super::palette::Palette;

/// Bitrate passed to the audio extractor for the MP3 preset
pub const AUDIO_QUALITY: &str = "192K";
pub const AUDIO_CODEC: &str = "mp3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityKind {
    Video,
    /// Needs ffmpeg for transcoding
    AudioMp3,
}

/// A selectable entry of the quality menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityPreset {
    /// Menu key typed by the user
    pub key: &'static str,
    pub label: &'static str,
    /// yt-dlp `-f` format specification
    pub format_spec: &'static str,
    pub kind: QualityKind,
}

impl QualityPreset {
    pub fn is_audio(&self) -> bool {
        self.kind == QualityKind::AudioMp3
    }
}

const VIDEO_PRESETS: [QualityPreset; 3] = [
    QualityPreset {
        key: "1",
        label: "🏆 Best Available Quality (up to 4K/8K, WEBM/MP4)",
        format_spec: "bestvideo+bestaudio/best",
        kind: QualityKind::Video,
    },
    QualityPreset {
        key: "2",
        label: "💎 Full HD (1080p MP4)",
        format_spec: "bestvideo[height<=1080][ext=mp4]+bestaudio[ext=m4a]/best[height<=1080]",
        kind: QualityKind::Video,
    },
    QualityPreset {
        key: "3",
        label: "📱 Good Quality (720p MP4)",
        format_spec: "bestvideo[height<=720][ext=mp4]+bestaudio[ext=m4a]/best[height<=720]",
        kind: QualityKind::Video,
    },
];

const AUDIO_PRESET: QualityPreset = QualityPreset {
    key: "4",
    label: "🎵 Audio Only (Best Quality MP3)",
    format_spec: "bestaudio/best",
    kind: QualityKind::AudioMp3,
};

/// Menu entries; audio extraction is only offered when ffmpeg is present
pub fn available_presets(has_ffmpeg: bool) -> Vec<QualityPreset> {
    let mut presets = VIDEO_PRESETS.to_vec();
    if has_ffmpeg {
        presets.push(AUDIO_PRESET);
    }
    presets
}

/// Result of interpreting one line of user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Selected(QualityPreset),
    Quit,
    Invalid,
}

pub fn parse_choice(input: &str, presets: &[QualityPreset]) -> Choice {
    let input = input.trim();

    if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
        return Choice::Quit;
    }

    presets
        .iter()
        .find(|p| p.key == input)
        .map_or(Choice::Invalid, |p| Choice::Selected(*p))
}

pub fn render_menu(presets: &[QualityPreset], palette: &Palette) -> String {
    let mut menu = format!("\n{}\n", palette.bold("⚙️ Select Download Quality:"));
    for preset in presets {
        menu.push_str(&format!("   [{}] {}\n", preset.key, preset.label));
    }
    menu
}

/// Ask until a valid preset is picked. `None` means the user quit or input ended.
pub fn prompt_quality<R: BufRead, W: Write>(
    presets: &[QualityPreset],
    input: &mut R,
    output: &mut W,
    palette: &Palette,
) -> io::Result<Option<QualityPreset>> {
    write!(output, "{}", render_menu(presets, palette))?;

    let prompt = format!("\nChoose an option [1-{}] or 'q' to quit: ", presets.len());
    let mut line = String::new();

    loop {
        write!(output, "{}", palette.bold(&prompt))?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            return Ok(None);
        }

        match parse_choice(&line, presets) {
            Choice::Selected(preset) => {
                writeln!(output, "{}", palette.green(&format!("✅ Selected: {}", preset.label)))?;
                return Ok(Some(preset));
            }
            Choice::Quit => return Ok(None),
            Choice::Invalid => {
                writeln!(output, "{}", palette.red("❌ Invalid choice. Please try again."))?;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_audio_only_with_ffmpeg() {
        assert_eq!(available_presets(false).len(), 3);
        let with_ffmpeg = available_presets(true);
        assert_eq!(with_ffmpeg.len(), 4);
        assert!(with_ffmpeg[3].is_audio());
        assert!(!available_presets(false).iter().any(QualityPreset::is_audio));
    }

    #[test]
    fn test_parse_choice() {
        let presets = available_presets(true);
        assert_eq!(parse_choice(" 2\n", &presets), Choice::Selected(presets[1]));
        assert_eq!(parse_choice("Q", &presets), Choice::Quit);
        assert_eq!(parse_choice("quit", &presets), Choice::Quit);
        assert_eq!(parse_choice("7", &presets), Choice::Invalid);
        assert_eq!(parse_choice("", &presets), Choice::Invalid);
    }

    #[test]
    fn test_audio_key_invalid_without_ffmpeg() {
        let presets = available_presets(false);
        assert_eq!(parse_choice("4", &presets), Choice::Invalid);
    }

    #[test]
    fn test_prompt_retries_until_valid() {
        let presets = available_presets(false);
        let mut input = Cursor::new("9\nabc\n3\n");
        let mut output = Vec::new();

        let picked = prompt_quality(&presets, &mut input, &mut output, &Palette::plain()).unwrap();

        assert_eq!(picked, Some(presets[2]));
        let text = String::from_utf8(output).unwrap();
        assert_eq!(text.matches("Invalid choice").count(), 2);
        assert!(text.contains("Choose an option [1-3]"));
        assert!(text.contains("Selected: 📱 Good Quality (720p MP4)"));
    }

    #[test]
    fn test_prompt_quit_and_eof() {
        let presets = available_presets(true);
        let mut output = Vec::new();

        let quit = prompt_quality(&presets, &mut Cursor::new("q\n"), &mut output, &Palette::plain());
        assert_eq!(quit.unwrap(), None);

        let eof = prompt_quality(&presets, &mut Cursor::new(""), &mut output, &Palette::plain());
        assert_eq!(eof.unwrap(), None);
    }
}
