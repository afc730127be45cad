// Terminal coloring, passed to renderers instead of living in globals

use console::Style;

/// Display capability handed to every renderer.
///
/// A disabled palette returns text untouched, so the same rendering code
/// serves terminals, pipes and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// No escape codes at all
    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Colors unless disabled by flag, `NO_COLOR`/`CLICOLOR` or a non-tty stdout
    pub fn detect(no_color: bool) -> Self {
        Self::new(!no_color && console::colors_enabled())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn red(&self, text: &str) -> String {
        self.paint(Style::new().red(), text)
    }

    pub fn green(&self, text: &str) -> String {
        self.paint(Style::new().green(), text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.paint(Style::new().yellow(), text)
    }

    pub fn blue(&self, text: &str) -> String {
        self.paint(Style::new().blue(), text)
    }

    pub fn cyan(&self, text: &str) -> String {
        self.paint(Style::new().cyan(), text)
    }

    pub fn bold(&self, text: &str) -> String {
        self.paint(Style::new().bold(), text)
    }

    fn paint(&self, style: Style, text: &str) -> String {
        if self.enabled {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::plain()
    }
}
