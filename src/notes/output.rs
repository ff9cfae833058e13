use std::fmt;
use std::str::FromStr;

use super::classify::{NotesFormat, classify};
use super::preview::render_preview;
use super::secrets::extract_references;
use crate::error::NotesError;

/// Caller-supplied format: either detect it or trust the given one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatHint {
    #[default]
    Auto,
    Fixed(NotesFormat),
}

impl FormatHint {
    pub fn resolve(self, text: &str) -> NotesFormat {
        match self {
            FormatHint::Auto => classify(text),
            FormatHint::Fixed(format) => format,
        }
    }
}

impl FromStr for FormatHint {
    type Err = NotesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(FormatHint::Auto);
        }
        s.parse().map(FormatHint::Fixed).map_err(|_| NotesError::InvalidFormat {
            value: s.to_string(),
            expected: "auto, html, markdown, plain".into(),
        })
    }
}

impl fmt::Display for FormatHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatHint::Auto => f.write_str("auto"),
            FormatHint::Fixed(format) => fmt::Display::fmt(format, f),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedNotes {
    pub content: String,
    pub format: NotesFormat,
    pub secret_references: Vec<String>,
    /// Length of `content` in characters.
    pub length: usize,
    /// Display rendering, only present when explicitly requested.
    pub preview: Option<String>,
}

impl FormattedNotes {
    /// Attach a display rendering. Markdown is rendered; HTML is already a
    /// display form and plain text has nothing to render.
    pub fn with_preview(mut self) -> Self {
        let preview = match self.format {
            NotesFormat::Markdown => render_preview(&self.content),
            NotesFormat::Html | NotesFormat::Plain => self.content.clone(),
        };
        self.preview = Some(preview);
        self
    }
}

pub fn format_output(raw: &str, hint: FormatHint, parse_secrets: bool) -> FormattedNotes {
    let secret_references = if parse_secrets {
        extract_references(raw)
    } else {
        Vec::new()
    };
    FormattedNotes {
        content: raw.to_string(),
        format: hint.resolve(raw),
        secret_references,
        length: raw.chars().count(),
        preview: None,
    }
}
