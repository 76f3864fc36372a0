//! Section rendering: classified lines → LaTeX blocks.
//!
//! Two variants for the two upstream text shapes, sharing one structural
//! invariant: within a section, blocks are emitted in the fixed order
//! table → paragraphs → itemized list, regardless of how the source
//! interleaved the lines. The reordering is deliberate normalization so the
//! tabular data reads first, prose second, question lists last.
//!
//! * Variant A ([`render_freeform_section`]) — loose free text split into
//!   `SECTION n:` sections (OCR transcripts).
//! * Variant B ([`render_tagged_report_body`]) — the markdown-tagged report
//!   produced by the synthesis model.
//!
//! Rendering never fails; anything unrecognised falls through to the
//! escaped plain-text path.

use crate::config::ConversionConfig;
use crate::pipeline::classify::{
    classify_report_line, classify_section_line, content_lines, ClassifiedLine,
};
use crate::pipeline::escape::{escape, escape_report};
use crate::pipeline::split::Section;

/// Per-section render tallies, rolled up into
/// [`crate::output::DocumentStats`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderCounts {
    pub table_rows: usize,
    pub paragraphs: usize,
    pub checkbox_items: usize,
    pub list_items: usize,
    pub subsections: usize,
}

impl RenderCounts {
    pub fn absorb(&mut self, other: RenderCounts) {
        self.table_rows += other.table_rows;
        self.paragraphs += other.paragraphs;
        self.checkbox_items += other.checkbox_items;
        self.list_items += other.list_items;
        self.subsections += other.subsections;
    }
}

// ── Variant A: freeform OCR sections ─────────────────────────────────────

/// Render one freeform section: `\section` header, then key/value rows as a
/// `tabularx` table, narrative runs as paragraphs, checkbox questions as an
/// `itemize` list.
///
/// Consecutive narrative lines join with single spaces into one paragraph;
/// a non-narrative line in between starts a new paragraph group. A section
/// with no classifiable content emits only its header.
pub fn render_freeform_section(
    section: &Section,
    config: &ConversionConfig,
) -> (String, RenderCounts) {
    let mut rows: Vec<(String, String)> = Vec::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current_paragraph: Vec<String> = Vec::new();
    let mut checkbox_items: Vec<String> = Vec::new();

    for line in content_lines(&section.body) {
        match classify_section_line(line, &config.lexicon, config.limits) {
            ClassifiedLine::KeyValue { key, value } => {
                close_paragraph(&mut current_paragraph, &mut paragraphs);
                rows.push((key, value));
            }
            ClassifiedLine::CheckboxQuestion { normalized } => {
                close_paragraph(&mut current_paragraph, &mut paragraphs);
                checkbox_items.push(normalized);
            }
            ClassifiedLine::Narrative { text } => current_paragraph.push(text),
            // The freeform classifier only produces the three roles above.
            _ => current_paragraph.push(line.to_string()),
        }
    }
    close_paragraph(&mut current_paragraph, &mut paragraphs);

    let mut latex = format!("\\section{{{}}}\n\n", escape(&section.title));

    if !rows.is_empty() {
        latex.push_str("\\begin{tabularx}{\\textwidth}{l X}\n\\toprule\n");
        for (key, value) in &rows {
            latex.push_str(&format!("{} & {} \\\\\n", escape(key), escape(value)));
        }
        latex.push_str("\\bottomrule\n\\end{tabularx}\n\n");
    }

    for paragraph in &paragraphs {
        latex.push_str(&escape(paragraph));
        latex.push_str("\n\n");
    }

    if !checkbox_items.is_empty() {
        latex.push_str("\\begin{itemize}[leftmargin=*]\n");
        for item in &checkbox_items {
            latex.push_str(&format!("\\item {}\n", escape(item)));
        }
        latex.push_str("\\end{itemize}\n\n");
    }

    let counts = RenderCounts {
        table_rows: rows.len(),
        paragraphs: paragraphs.len(),
        checkbox_items: checkbox_items.len(),
        ..RenderCounts::default()
    };
    (latex, counts)
}

fn close_paragraph(current: &mut Vec<String>, paragraphs: &mut Vec<String>) {
    if !current.is_empty() {
        paragraphs.push(current.join(" "));
        current.clear();
    }
}

// ── Variant B: markdown-tagged synthesized report ────────────────────────

/// The synthesis model repeats the document title as its first output line
/// even though the preamble already sets it via `\maketitle`.
const REDUNDANT_TITLE: &str = "MEDICAL REPORT";

/// Render the body of a markdown-tagged report.
///
/// Sequential scan with a single open/closed list flag: bold section
/// headers become `\section`/`\subsection`, `*` bullets accumulate into one
/// `itemize` environment, colon lines become bold key/value pairs (values
/// longer than `wrap_threshold` break onto their own wrapped `\parbox`
/// line), and everything else is escaped plain text. Blank lines and any
/// non-bullet line close an open list; so does end of input.
pub fn render_tagged_report_body(text: &str, config: &ConversionConfig) -> (String, RenderCounts) {
    let mut out: Vec<String> = Vec::new();
    let mut counts = RenderCounts::default();
    let mut in_itemize = false;
    let mut seen_substantive_line = false;

    fn close_list(out: &mut Vec<String>, in_itemize: &mut bool) {
        if *in_itemize {
            out.push("\\end{itemize}".to_string());
            out.push(String::new());
            *in_itemize = false;
        }
    }

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            close_list(&mut out, &mut in_itemize);
            continue;
        }

        // Suppress the redundant title, once, only as the opening line.
        if !seen_substantive_line && line.eq_ignore_ascii_case(REDUNDANT_TITLE) {
            seen_substantive_line = true;
            continue;
        }
        seen_substantive_line = true;

        match classify_report_line(line) {
            ClassifiedLine::SectionHeader { title } => {
                close_list(&mut out, &mut in_itemize);
                out.push(format!("\\section{{{}}}", escape_report(&title)));
            }
            ClassifiedLine::SubsectionHeader { title } => {
                close_list(&mut out, &mut in_itemize);
                counts.subsections += 1;
                out.push(format!("\\subsection{{{}}}", escape_report(&title)));
            }
            ClassifiedLine::ListItem { text, pair } => {
                if !in_itemize {
                    out.push("\\begin{itemize}".to_string());
                    in_itemize = true;
                }
                counts.list_items += 1;
                match pair {
                    Some((key, value)) => out.push(format!(
                        "\\item \\textbf{{{}:}} {}",
                        escape_report(&key),
                        escape_report(&value)
                    )),
                    None => out.push(format!("\\item {}", escape_report(&text))),
                }
            }
            ClassifiedLine::KeyValue { key, value } => {
                close_list(&mut out, &mut in_itemize);
                counts.table_rows += 1;
                let key = escape_report(&key);
                let value = escape_report(&value);
                if value.chars().count() > config.wrap_threshold {
                    out.push(format!("\\noindent\\textbf{{{key}:}} \\\\"));
                    out.push(format!("\\parbox{{\\textwidth}}{{{value}}}"));
                } else {
                    out.push(format!("\\textbf{{{key}:}} {value}"));
                }
            }
            ClassifiedLine::Narrative { text }
            | ClassifiedLine::CheckboxQuestion { normalized: text } => {
                close_list(&mut out, &mut in_itemize);
                counts.paragraphs += 1;
                out.push(escape_report(&text));
            }
        }

        out.push(String::new());
    }

    close_list(&mut out, &mut in_itemize);

    (out.join("\n"), counts)
}
