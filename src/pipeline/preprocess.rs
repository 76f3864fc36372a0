//! Pre-processing: deterministic cleanup of raw transcript text.
//!
//! OCR engines and LLM responses both produce structurally noisy text —
//! Windows line endings, runs of blank lines, zero-width characters that
//! survive copy-paste round trips. These rules normalise the transcript
//! before section splitting so the splitter and classifier only ever see
//! `\n`-separated, visibly meaningful lines.
//!
//! Each rule is a pure `&str → String` function, applied in a fixed order:
//! line endings first (so the blank-line regex sees only `\n`), invisible
//! characters before trimming (a line of zero-width spaces must trim away).

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a raw transcript.
pub fn clean_transcript(input: &str) -> String {
    let s = normalise_line_endings(input);
    let s = remove_invisible_chars(&s);
    let s = collapse_blank_lines(&s);
    s.trim().to_string()
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip invisible Unicode ──────────────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 3: Collapse excessive blank lines ───────────────────────────────

static RE_BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

fn collapse_blank_lines(input: &str) -> String {
    RE_BLANK_LINES.replace_all(input, "\n\n").to_string()
}
