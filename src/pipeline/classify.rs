//! Line classification: assign every transcript line exactly one role.
//!
//! Two strategies exist for the two source-text shapes:
//!
//! * [`classify_section_line`] — freeform OCR section bodies. Precedence:
//!   checkbox question → key/value → narrative. Order matters: a line like
//!   `Pain present: M No` satisfies both the checkbox and the key/value
//!   rule, and the checkbox rule must win.
//! * [`classify_report_line`] — markdown-tagged synthesized reports.
//!   Precedence: section header → subsection header → bullet → key/value →
//!   narrative.
//!
//! Classification is total: every non-blank line gets exactly one role,
//! defaulting to [`ClassifiedLine::Narrative`]. It never fails.

use once_cell::sync::Lazy;
use regex::Regex;

/// One classified line with its role-specific parse.
///
/// Produced transiently while rendering and discarded afterwards; nothing
/// here outlives a single conversion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedLine {
    /// A checkbox question with OCR glyph noise rewritten to canonical
    /// `\checkedbox`/`\checkbox` markers.
    CheckboxQuestion { normalized: String },
    /// A single-colon key/value line that passed the length heuristic.
    KeyValue { key: String, value: String },
    /// A `*`-bulleted line (tagged strategy only); `pair` holds the embedded
    /// key/value split when the content carries exactly one colon.
    ListItem {
        text: String,
        pair: Option<(String, String)>,
    },
    /// A `**SECTION n: …**` heading (tagged strategy only), marker stripped.
    SectionHeader { title: String },
    /// Any other `**…**` heading (tagged strategy only), marker stripped.
    SubsectionHeader { title: String },
    /// Everything else.
    Narrative { text: String },
}

// ── Checkbox noise lexicon ───────────────────────────────────────────────

/// One noise-to-marker rewrite rule.
#[derive(Debug, Clone)]
pub struct CheckboxRule {
    pub pattern: Regex,
    pub replacement: String,
}

/// Dictionary of OCR checkbox-glyph misrecognitions and their canonical
/// marker rewrites.
///
/// The OCR pipeline renders checkbox glyphs as stray letters next to the
/// answer label ("O Yes", "M No", "VI No", "CJ Not Sure"). These patterns
/// are corpus-specific and brittle, so they live in data rather than code:
/// extend the set with [`CheckboxLexicon::with_rule`] as new artifacts are
/// observed.
#[derive(Debug, Clone)]
pub struct CheckboxLexicon {
    rules: Vec<CheckboxRule>,
}

impl CheckboxLexicon {
    /// Lexicon with no rules; nothing classifies as a checkbox question.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rewrite rule. Rules apply in insertion order and later rules
    /// see the output of earlier ones.
    pub fn with_rule(mut self, pattern: Regex, replacement: impl Into<String>) -> Self {
        self.rules.push(CheckboxRule {
            pattern,
            replacement: replacement.into(),
        });
        self
    }

    /// Does any rule match this line?
    pub fn detect(&self, line: &str) -> bool {
        self.rules.iter().any(|r| r.pattern.is_match(line))
    }

    /// Rewrite every matching noise substring to its canonical marker.
    /// Multiple rules may fire on the same line; all are applied.
    pub fn normalize(&self, line: &str) -> String {
        let mut out = line.to_string();
        for rule in &self.rules {
            out = rule
                .pattern
                .replace_all(&out, rule.replacement.as_str())
                .to_string();
        }
        out
    }
}

impl Default for CheckboxLexicon {
    /// The rewrite set observed in the source corpus.
    ///
    /// Affirmative glyph noise maps to `\checkedbox~Yes`, negative noise to
    /// `\checkbox~No`, and the "not sure" form to `\checkbox~Not~Sure`.
    fn default() -> Self {
        Self::empty()
            .with_rule(Regex::new(r"OO?\s*Yes").unwrap(), "\\checkedbox~Yes")
            .with_rule(Regex::new(r"MYes").unwrap(), "\\checkedbox~Yes")
            .with_rule(Regex::new(r"MI?\s*No").unwrap(), "\\checkbox~No")
            .with_rule(Regex::new(r"VINo").unwrap(), "\\checkbox~No")
            .with_rule(Regex::new(r"OOINo").unwrap(), "\\checkbox~No")
            .with_rule(
                Regex::new(r"CJ\s*Not\s*Sure").unwrap(),
                "\\checkbox~Not~Sure",
            )
    }
}

// ── Key/value splitting ──────────────────────────────────────────────────

/// Length limits for the key/value heuristic.
///
/// Narrative sentences that happen to contain one colon ("Time: the patient
/// arrived…") must not be forced into table rows; clauses longer than these
/// limits demote to narrative.
#[derive(Debug, Clone, Copy)]
pub struct KeyValueLimits {
    pub max_key_chars: usize,
    pub max_value_chars: usize,
}

impl Default for KeyValueLimits {
    fn default() -> Self {
        Self {
            max_key_chars: 100,
            max_value_chars: 200,
        }
    }
}

/// Split a line containing exactly one `:` into trimmed (key, value).
/// Returns `None` for zero or multiple colons.
pub fn split_single_colon(line: &str) -> Option<(String, String)> {
    if line.matches(':').count() != 1 {
        return None;
    }
    let (key, value) = line.split_once(':')?;
    Some((key.trim().to_string(), value.trim().to_string()))
}

fn split_key_value(line: &str, limits: KeyValueLimits) -> Option<(String, String)> {
    let (key, value) = split_single_colon(line)?;
    if key.chars().count() < limits.max_key_chars && value.chars().count() < limits.max_value_chars
    {
        Some((key, value))
    } else {
        None
    }
}

// ── Freeform strategy ────────────────────────────────────────────────────

/// Filter a section body down to the lines the classifier sees: trimmed,
/// non-blank, and not `[n]`-prefixed timeline artifacts.
pub fn content_lines(body: &str) -> impl Iterator<Item = &str> {
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('['))
}

/// Classify one freeform section-body line.
pub fn classify_section_line(
    line: &str,
    lexicon: &CheckboxLexicon,
    limits: KeyValueLimits,
) -> ClassifiedLine {
    if lexicon.detect(line) {
        return ClassifiedLine::CheckboxQuestion {
            normalized: lexicon.normalize(line),
        };
    }
    if let Some((key, value)) = split_key_value(line, limits) {
        return ClassifiedLine::KeyValue { key, value };
    }
    ClassifiedLine::Narrative {
        text: line.to_string(),
    }
}

// ── Tagged strategy ──────────────────────────────────────────────────────

static RE_SECTION_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*SECTION\s*\d+\s*:.*\*\*$").unwrap());

/// Classify one line of a markdown-tagged synthesized report.
pub fn classify_report_line(line: &str) -> ClassifiedLine {
    let line = line.trim();

    if RE_SECTION_HEADER.is_match(line) {
        return ClassifiedLine::SectionHeader {
            title: strip_bold_markers(line),
        };
    }

    if line.starts_with("**") && line.ends_with("**") && line.len() > 4 {
        return ClassifiedLine::SubsectionHeader {
            title: strip_bold_markers(line),
        };
    }

    if line.starts_with('*') && !line.starts_with("**") {
        let content = line[1..].trim().to_string();
        let pair = split_single_colon(&content);
        return ClassifiedLine::ListItem {
            text: content,
            pair,
        };
    }

    if let Some((key, value)) = split_single_colon(line) {
        return ClassifiedLine::KeyValue { key, value };
    }

    ClassifiedLine::Narrative {
        text: line.to_string(),
    }
}

fn strip_bold_markers(line: &str) -> String {
    line.trim_matches('*').trim().to_string()
}
