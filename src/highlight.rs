use std::io::{self, IsTerminal};

use inksac::prelude::*;

/// Colors for the prompt, banner and error hints. Falls back to plain text
/// when stdout is not a terminal or the terminal has no color.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    color_support: ColorSupport,
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}

impl Palette {
    pub fn new() -> Self {
        let support = if io::stdout().is_terminal() {
            check_color_support().unwrap_or(ColorSupport::NoColor)
        } else {
            ColorSupport::NoColor
        };
        Self {
            color_support: support,
        }
    }

    pub fn plain() -> Self {
        Self {
            color_support: ColorSupport::NoColor,
        }
    }

    pub fn is_plain(&self) -> bool {
        matches!(self.color_support, ColorSupport::NoColor)
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.is_plain() {
            return text.to_string();
        }
        text.style(style).to_string()
    }

    /// `[user@host dir]$ ` with the identity in green and the directory in blue.
    pub fn prompt(&self, user: &str, host: &str, dir: &str, symbol: char) -> String {
        let identity = self.paint(
            &format!("{}@{}", user, host),
            Style::builder().foreground(Color::Green).bold().build(),
        );
        let dir = self.paint(dir, Style::builder().foreground(Color::Blue).bold().build());
        format!("[{} {}]{} ", identity, dir, symbol)
    }

    pub fn banner(&self, text: &str) -> String {
        self.paint(text, Style::builder().foreground(Color::Cyan).bold().build())
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(text, Style::builder().foreground(Color::Red).bold().build())
    }

    pub fn hint(&self, text: &str) -> String {
        self.paint(
            text,
            Style::builder().foreground(Color::RGB(128, 128, 128)).build(),
        )
    }
}
