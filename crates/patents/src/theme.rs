use clap::ValueEnum;
use colored::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
  #[default]
  Light,
  Dark,
}

/// Colours used by the terminal views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
  pub accent: Color,
  pub secondary: Color,
  pub muted: Color,
  pub error: Color,
  /// Word cloud tiers, highest frequency first
  pub tiers: [Color; 3],
}

/// Process-wide display settings, created at startup and handed to every view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThemeContext {
  theme: Theme,
}

impl ThemeContext {
  pub fn new(theme: Theme) -> Self {
    Self { theme }
  }

  pub fn theme(&self) -> Theme {
    self.theme
  }

  pub fn toggle(&mut self) {
    self.theme = match self.theme {
      Theme::Light => Theme::Dark,
      Theme::Dark => Theme::Light,
    };
  }

  pub fn palette(&self) -> Palette {
    match self.theme {
      Theme::Light => Palette {
        accent: Color::Blue,
        secondary: Color::Magenta,
        muted: Color::BrightBlack,
        error: Color::Red,
        tiers: [Color::Blue, Color::Magenta, Color::BrightBlack],
      },
      Theme::Dark => Palette {
        accent: Color::BrightCyan,
        secondary: Color::BrightMagenta,
        muted: Color::White,
        error: Color::BrightRed,
        tiers: [Color::BrightCyan, Color::BrightMagenta, Color::White],
      },
    }
  }
}
