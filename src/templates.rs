//! LaTeX document templates and the report-synthesis prompt.
//!
//! Centralising every emitted-verbatim string here serves two purposes:
//!
//! 1. **Single source of truth** — changing the document preamble (adding a
//!    package, tweaking the checkbox macros) requires editing exactly one
//!    place.
//!
//! 2. **Testability** — unit tests can inspect templates directly without
//!    rendering a document, so a dropped package or macro is easy to catch.
//!
//! Two preambles exist because the two rendering variants need different
//! machinery: the freeform variant needs `tabularx`/`booktabs` for key/value
//! tables and the checkbox macros; the report variant needs `seqsplit` for
//! identifier breaking plus front matter (abstract, table of contents).

/// Build the preamble for a freeform-sections document.
///
/// Defines the `\checkbox` / `\checkedbox` macros the checkbox normaliser
/// emits; the escaping guard in [`crate::pipeline::escape::escape`] depends
/// on exactly these control-sequence names.
pub fn freeform_preamble(title: &str, author: &str) -> String {
    format!(
        r"\documentclass[11pt,a4paper]{{article}}
\usepackage[utf8]{{inputenc}}
\usepackage[margin=1in]{{geometry}}
\usepackage{{fancyhdr}}
\usepackage{{graphicx}}
\usepackage{{tabularx}}
\usepackage{{booktabs}}
\usepackage{{enumitem}}
\usepackage{{url}}
\usepackage{{hyperref}}
\usepackage{{amssymb}}

\newcommand{{\checkbox}}{{\(\Box\)}}
\newcommand{{\checkedbox}}{{\(\boxtimes\)}}

\pagestyle{{fancy}}
\fancyhf{{}}
\rhead{{{title}}}
\cfoot{{\thepage}}

\title{{{title}}}
\author{{{author}}}
\date{{\today}}

\begin{{document}}

\maketitle

"
    )
}

/// Build the preamble for a synthesized-report document.
///
/// `seqsplit` provides the identifier-breaking macro
/// [`crate::pipeline::escape::escape_report`] emits; `\emergencystretch`
/// absorbs the remaining overfull lines long medical terms cause.
pub fn report_preamble(title: &str, author: &str) -> String {
    format!(
        r"\documentclass[11pt,a4paper]{{article}}
\usepackage[utf8]{{inputenc}}
\usepackage[margin=1in]{{geometry}}
\usepackage{{fancyhdr}}
\usepackage{{tabularx}}
\usepackage{{booktabs}}
\usepackage{{enumitem}}
\usepackage{{url}}
\usepackage{{hyperref}}
\usepackage{{amssymb}}
\usepackage{{seqsplit}}

\emergencystretch=3em

\pagestyle{{fancy}}
\fancyhf{{}}
\rhead{{{title}}}
\cfoot{{\thepage}}

\title{{{title}}}
\author{{{author}}}
\date{{\today}}

\begin{{document}}

\maketitle

\begin{{abstract}}
Consolidated medical report synthesized from source transcripts. Content is
organised into standard clinical sections; source wording is preserved where
possible.
\end{{abstract}}

\tableofcontents
\newpage

"
    )
}

/// Closing line shared by both document variants.
pub const CLOSING: &str = "\\end{document}\n";

/// Footer block for the report variant, stamped with the generation time.
pub fn report_footer(generated_at: &str) -> String {
    format!(
        "\n\\vspace{{2em}}\n\\noindent\\rule{{\\textwidth}}{{0.4pt}}\n\n\\noindent\\small Generated on {generated_at}.\n\n"
    )
}

/// Prompt sent to the synthesis model to merge multiple transcripts into one
/// tagged report. The placeholder `{transcripts}` must be replaced with the
/// concatenated source material before use.
///
/// The `**SECTION n: …**` / `**…**` / `*` tagging it mandates is exactly the
/// shape [`crate::pipeline::classify::classify_report_line`] recognises.
pub const SYNTHESIS_PROMPT: &str = r#"You are an experienced medical scribe. Merge the source transcripts below into ONE consolidated medical report.

Structure the report with exactly these sections, in this order:

**SECTION 1: PATIENT PARTICULARS**
**SECTION 2: CHIEF COMPLAINT**
**SECTION 3: MEDICAL HISTORY**
**SECTION 4: CLINICAL EXAMINATION**
**SECTION 5: ASSESSMENT**
**SECTION 6: TREATMENT PLAN**
**SECTION 7: FOLLOW-UP**

Formatting rules:
- Mark every section header as **SECTION n: TITLE** on its own line.
- Mark subsection headings as **Heading** on their own line.
- Use * at the start of a line for list items; write key/value items as * Key: Value.
- Write field lines as Key: Value with exactly one colon.
- Plain prose lines need no markup.

Content rules:
- Merge duplicate information; never invent facts not present in the sources.
- Preserve identifiers (NRIC, case numbers, phone numbers) exactly as written.
- If a section has no source material, write "Not documented." under it.
- Output only the report. No commentary, no markdown fences."#;

/// Build the full synthesis request text for a set of source transcripts.
pub fn synthesis_request(transcripts: &str) -> String {
    format!("{SYNTHESIS_PROMPT}\n\n--- SOURCE TRANSCRIPTS ---\n\n{transcripts}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freeform_preamble_defines_checkbox_macros() {
        let p = freeform_preamble("T", "A");
        assert!(p.contains("\\newcommand{\\checkbox}{\\(\\Box\\)}"));
        assert!(p.contains("\\newcommand{\\checkedbox}{\\(\\boxtimes\\)}"));
        assert!(p.contains("\\begin{document}"));
        assert!(p.contains("\\title{T}"));
        assert!(p.contains("\\author{A}"));
    }

    #[test]
    fn report_preamble_loads_seqsplit_and_front_matter() {
        let p = report_preamble("T", "A");
        assert!(p.contains("\\usepackage{seqsplit}"));
        assert!(p.contains("\\tableofcontents"));
        assert!(p.contains("\\begin{abstract}"));
    }

    #[test]
    fn footer_carries_timestamp() {
        let f = report_footer("2026-08-27 10:00 UTC");
        assert!(f.contains("Generated on 2026-08-27 10:00 UTC."));
    }

    #[test]
    fn synthesis_request_embeds_sources() {
        let req = synthesis_request("transcript body");
        assert!(req.contains("SECTION 1: PATIENT PARTICULARS"));
        assert!(req.ends_with("transcript body"));
    }
}
