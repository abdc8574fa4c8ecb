//! Terminal capability detection and styling

use drawlots::Tier;
use owo_colors::{OwoColorize, colors::css};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Detects whether colored output should be enabled
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Detects terminal width, returning None if not available
pub fn terminal_width() -> Option<u16> {
    terminal_size::terminal_size().map(|(w, _)| w.0)
}

/// Columns `text` takes up. CJK characters count as two.
pub fn display_width(text: &str) -> usize {
    text.width()
}

/// Shorten `text` to fit in `width` columns, marking the cut with `…`.
pub fn fit(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }

    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut cut = String::new();
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        cut.push(c);
    }
    cut.push('…');
    cut
}

/// Pad `text` with spaces to `width` columns.
pub fn pad(text: &str, width: usize) -> String {
    let mut padded = text.to_string();
    padded.extend(std::iter::repeat_n(' ', width.saturating_sub(display_width(text))));
    padded
}

/// Extension trait for styling output
pub trait Paint {
    /// Style as success (green)
    fn success(&self) -> String;
    /// Style as warning (amber)
    fn warning(&self) -> String;
    /// Style as a heading (bold)
    fn heading(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl Paint for str {
    fn success(&self) -> String {
        styled(self, |s| s.fg::<css::Green>().to_string())
    }

    fn warning(&self) -> String {
        styled(self, |s| s.fg::<css::Orange>().to_string())
    }

    fn heading(&self) -> String {
        styled(self, |s| s.bold().to_string())
    }

    fn dim(&self) -> String {
        styled(self, |s| s.dimmed().to_string())
    }
}

impl Paint for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn heading(&self) -> String {
        self.as_str().heading()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}

/// The star bar for a tier, in gold when color is on.
pub fn stars(tier: Tier) -> String {
    styled(&tier.stars(), |s| s.fg::<css::Gold>().to_string())
}

fn styled(text: &str, paint: impl FnOnce(&str) -> String) -> String {
    if supports_color() {
        paint(text)
    } else {
        text.to_string()
    }
}
