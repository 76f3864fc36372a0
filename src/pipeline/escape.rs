//! LaTeX escaping for transcript text.
//!
//! Every token the renderer emits passes through [`escape`] exactly once.
//! The substitution table is fixed by the output contract — downstream
//! templates (and any archived `.tex` diffs) depend on these exact escape
//! forms, so the table must not change shape:
//!
//! | char | escaped form        |
//! |------|---------------------|
//! | `&`  | `\&`                |
//! | `%`  | `\%`                |
//! | `$`  | `\$`                |
//! | `#`  | `\#`                |
//! | `^`  | `\^{}`              |
//! | `_`  | `\_`                |
//! | `{`  | `\{`                |
//! | `}`  | `\}`                |
//! | `~`  | `\~{}`              |
//! | `\`  | `\textbackslash{}`  |
//!
//! The scan is a single pass over characters, so a replacement can never
//! re-match text introduced by an earlier replacement.

use once_cell::sync::Lazy;
use regex::Regex;

/// Canonical checked-box control sequence emitted by checkbox normalization.
pub const CHECKED_BOX: &str = "\\checkedbox";
/// Canonical unchecked-box control sequence emitted by checkbox normalization.
pub const UNCHECKED_BOX: &str = "\\checkbox";

/// Escape LaTeX-reserved characters in `text`.
///
/// Guard: text that already carries the canonical checkbox control
/// sequences has been through a rendering pass; escaping it again would
/// corrupt the macros (`\checkbox` → `\textbackslash{}checkbox`), so such
/// input is returned unchanged.
///
/// Total over all inputs; the empty string maps to itself.
pub fn escape(text: &str) -> String {
    if text.contains(CHECKED_BOX) || text.contains(UNCHECKED_BOX) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => out.push_str("\\&"),
            '%' => out.push_str("\\%"),
            '$' => out.push_str("\\$"),
            '#' => out.push_str("\\#"),
            '^' => out.push_str("\\^{}"),
            '_' => out.push_str("\\_"),
            '{' => out.push_str("\\{"),
            '}' => out.push_str("\\}"),
            '~' => out.push_str("\\~{}"),
            '\\' => out.push_str("\\textbackslash{}"),
            _ => out.push(c),
        }
    }
    out
}

// ── Report-variant token breaking ────────────────────────────────────────

// NRIC/FIN-shaped identifiers (S1234567A). Unbreakable in LaTeX and long
// enough to overflow a column when set inline.
static RE_NRIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([STG]\d{7}[A-Z])\b").unwrap());

// Unbroken digit runs of 10+ (phone numbers, case IDs).
static RE_LONG_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{10,})\b").unwrap());

/// Escape for the synthesized-report variant: [`escape`] plus `\seqsplit`
/// wrapping of tokens that cannot hyphenate (NRIC numbers, 10+-digit runs).
///
/// The `\seqsplit` macro is defined in the report preamble; it inserts
/// discretionary breaks between characters so these tokens wrap instead of
/// overflowing the text column.
pub fn escape_report(text: &str) -> String {
    let escaped = escape(text);
    let broken = RE_NRIC.replace_all(&escaped, "\\seqsplit{$1}");
    RE_LONG_DIGITS
        .replace_all(&broken, "\\seqsplit{$1}")
        .to_string()
}
