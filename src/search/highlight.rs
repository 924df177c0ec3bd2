//! Match highlighting for result previews

use super::find::Match;
use serde::{Deserialize, Serialize};

/// Output format for highlighted previews
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightFormat {
    /// HTML-escaped text with `<span class="csr-highlight">` markers
    Html,
    /// Control characters neutralised, matches shown in reverse video
    #[default]
    Terminal,
}

impl HighlightFormat {
    fn open(self) -> &'static str {
        match self {
            HighlightFormat::Html => r#"<span class="csr-highlight">"#,
            HighlightFormat::Terminal => "\x1b[7m",
        }
    }

    fn close(self) -> &'static str {
        match self {
            HighlightFormat::Html => "</span>",
            HighlightFormat::Terminal => "\x1b[27m",
        }
    }

    /// Escape text so it cannot be mistaken for markup in this format
    pub fn escape(self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match self {
                HighlightFormat::Html => match c {
                    '&' => out.push_str("&amp;"),
                    '<' => out.push_str("&lt;"),
                    '>' => out.push_str("&gt;"),
                    '"' => out.push_str("&quot;"),
                    '\'' => out.push_str("&#39;"),
                    _ => out.push(c),
                },
                HighlightFormat::Terminal => match c {
                    '\n' | '\t' => out.push(c),
                    c if c.is_control() => {
                        out.push_str(&c.escape_default().to_string());
                    }
                    _ => out.push(c),
                },
            }
        }
        out
    }
}

/// Render `text` with every match wrapped in highlight markers.
///
/// Matches are processed rightmost first and offsets always index the raw
/// text, so inserting markers never shifts a match that is still pending.
/// Every segment is escaped before it is emitted.
pub fn highlight(text: &str, matches: &[Match], format: HighlightFormat) -> String {
    let mut ordered: Vec<&Match> = matches.iter().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let mut pieces: Vec<String> = Vec::with_capacity(ordered.len() * 2 + 1);
    let mut cursor = text.len();

    for m in ordered {
        if m.end > cursor || m.start > m.end {
            log::warn!("Skipping out-of-order highlight {}..{}", m.start, m.end);
            continue;
        }
        let (Some(tail), Some(body)) = (text.get(m.end..cursor), text.get(m.range())) else {
            log::warn!("Skipping highlight {}..{} off a char boundary", m.start, m.end);
            continue;
        };
        pieces.push(format.escape(tail));
        pieces.push(format!("{}{}{}", format.open(), format.escape(body), format.close()));
        cursor = m.start;
    }
    pieces.push(format.escape(&text[..cursor]));

    pieces.into_iter().rev().collect()
}

/// Cut a preview down to roughly `max_chars` characters around the first match.
///
/// Returns the clipped text and the matches shifted into its coordinates.
/// A `max_chars` of zero disables clipping.
pub fn clip_preview(text: &str, matches: &[Match], max_chars: usize) -> (String, Vec<Match>) {
    if max_chars == 0 || text.chars().count() <= max_chars {
        return (text.to_string(), matches.to_vec());
    }

    let anchor = matches.first().map(|m| m.start).unwrap_or(0);
    let lead = max_chars / 4;

    let start = text[..anchor]
        .char_indices()
        .rev()
        .nth(lead.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let end = text[start..]
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| start + i)
        .unwrap_or(text.len());

    let clipped = matches
        .iter()
        .filter(|m| m.start >= start && m.end <= end)
        .map(|m| Match {
            start: m.start - start,
            end: m.end - start,
            ..m.clone()
        })
        .collect();

    (text[start..end].to_string(), clipped)
}
