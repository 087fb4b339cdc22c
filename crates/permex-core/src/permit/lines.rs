//! Line normalization.

/// Ordered, trimmed, non-empty lines plus the source text they came from.
///
/// `lines` feeds segmentation and the table parsers. `raw` keeps blank lines and
/// indentation for rules that anchor on `\n` across adjacent lines; its line
/// endings are folded to `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineStream {
    lines: Vec<String>,
    raw: String,
}

impl LineStream {
    /// Split a text stream into normalized lines.
    pub fn from_text(text: &str) -> Self {
        let lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            lines,
            raw: text.replace("\r\n", "\n"),
        }
    }

    /// Trimmed, non-empty lines in source order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The line-preserving variant.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Normalized lines joined with `\n`.
    pub fn normalized_text(&self) -> String {
        self.lines.join("\n")
    }

    /// First `max_chars` characters of the normalized text.
    pub fn preview(&self, max_chars: usize) -> String {
        self.normalized_text().chars().take(max_chars).collect()
    }

    /// Whether no non-empty line exists.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
