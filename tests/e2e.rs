//! End-to-end integration tests for med2tex.
//!
//! The conversion core is pure, so unlike a service-backed pipeline these
//! tests need no fixtures or API keys: they feed transcript text through
//! the public API and assert on the emitted LaTeX.
//!
//! Run with:
//!   cargo test --test e2e -- --nocapture

use med2tex::{
    convert_dir, convert_dir_stream, convert_file, convert_text, ConversionConfig, SourceShape,
    SplitStrategy,
};
use futures::StreamExt;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn config() -> ConversionConfig {
    ConversionConfig::default()
}

/// Assert the LaTeX passes basic document-shape checks.
fn assert_latex_quality(latex: &str, context: &str) {
    assert!(!latex.trim().is_empty(), "[{context}] LaTeX is empty");
    assert!(
        latex.starts_with("\\documentclass"),
        "[{context}] Document must start with \\documentclass"
    );
    assert!(
        latex.contains("\\begin{document}"),
        "[{context}] Missing \\begin{{document}}"
    );
    assert!(
        latex.trim_end().ends_with("\\end{document}"),
        "[{context}] Document must end with \\end{{document}}"
    );

    // Balanced environments.
    for env in ["document", "tabularx", "itemize"] {
        let begins = latex.matches(&format!("\\begin{{{env}}}")).count();
        let ends = latex.matches(&format!("\\end{{{env}}}")).count();
        assert_eq!(begins, ends, "[{context}] Unbalanced {env} environment");
    }

    // No raw reserved characters outside control sequences: a lone '&'
    // outside a tabularx row would break compilation. Cheap proxy check —
    // '#' and '%' never legitimately appear unescaped in our output.
    for line in latex.lines() {
        if line.contains('%') {
            assert!(
                line.contains("\\%"),
                "[{context}] Unescaped %% in: {line:?}"
            );
        }
    }
}

// ── Freeform transcript scenarios ────────────────────────────────────────────

#[test]
fn full_intake_form_renders_all_block_kinds() {
    let transcript = "\
SECTION 1: PATIENT PARTICULARS
Name: Jane Doe
Age: 45
NRIC: S1234567A

SECTION 2: SCREENING
Fever in the last week? O Yes
Pain present: M No
Patient otherwise reports feeling well.
Sleep has been normal.

SECTION 3: NOTES
Plan discussed with patient & family (100% agreement).
";
    let output = convert_text(transcript, &config());
    assert_latex_quality(&output.latex, "intake form");

    // Section coverage, in source order.
    let latex = &output.latex;
    let s1 = latex.find("\\section{PATIENT PARTICULARS}").unwrap();
    let s2 = latex.find("\\section{SCREENING}").unwrap();
    let s3 = latex.find("\\section{NOTES}").unwrap();
    assert!(s1 < s2 && s2 < s3);

    // Key/value table.
    assert!(latex.contains("Name & Jane Doe \\\\"), "{latex}");
    assert!(latex.contains("Age & 45 \\\\"), "{latex}");

    // Checkbox normalization: noise gone, canonical markers present.
    assert!(latex.contains("\\checkedbox~Yes"), "{latex}");
    assert!(latex.contains("\\checkbox~No"), "{latex}");
    assert!(!latex.contains("O Yes"), "{latex}");
    assert!(!latex.contains("M No"), "{latex}");

    // Narrative run groups into one paragraph.
    assert!(
        latex.contains("Patient otherwise reports feeling well. Sleep has been normal."),
        "{latex}"
    );

    // Escaping applied to prose.
    assert!(latex.contains("patient \\& family (100\\% agreement)"), "{latex}");

    assert_eq!(output.stats.sections, 3);
    assert_eq!(output.stats.table_rows, 3);
    assert_eq!(output.stats.checkbox_items, 2);
}

#[test]
fn block_order_is_normalized_within_a_section() {
    let transcript = "\
SECTION 1: MIXED
Some opening prose.
Name: Jane
Question answered? M No
Closing prose.
";
    let latex = convert_text(transcript, &config()).latex;
    let table = latex.find("\\begin{tabularx}").unwrap();
    let prose = latex.find("Some opening prose.").unwrap();
    let list = latex.find("\\begin{itemize}").unwrap();
    assert!(table < prose, "table must precede paragraphs:\n{latex}");
    assert!(prose < list, "paragraphs must precede the list:\n{latex}");
}

#[test]
fn headerless_transcript_falls_back_to_report_section() {
    let latex = convert_text("Just prose.\nNo headers at all.", &config()).latex;
    assert!(latex.contains("\\section{Report}"), "{latex}");
    assert!(latex.contains("Just prose. No headers at all."), "{latex}");
}

#[test]
fn timeline_data_is_truncated() {
    let transcript = "\
SECTION 1: DIAGNOSIS
Condition noted as stable.
=== TIMELINE DATA ===
[1] 2024-01-02 admitted
[2] 2024-01-05 discharged
";
    let latex = convert_text(transcript, &config()).latex;
    assert!(latex.contains("Condition noted as stable."), "{latex}");
    assert!(!latex.contains("TIMELINE"), "{latex}");
    assert!(!latex.contains("admitted"), "{latex}");
}

#[test]
fn empty_input_yields_minimal_document() {
    let output = convert_text("", &config());
    assert_latex_quality(&output.latex, "empty input");
    assert!(!output.latex.contains("\\section"));
    assert_eq!(output.stats.sections, 0);
}

#[test]
fn keyword_splitting_buckets_topical_lines() {
    let cfg = ConversionConfig::builder()
        .split_strategy(SplitStrategy::Keywords)
        .build()
        .unwrap();
    let transcript = "\
Chief Complaint noted on arrival
Chest pain for two days.
Vital Signs
BP: 120/80
";
    let latex = convert_text(transcript, &cfg).latex;
    assert!(latex.contains("\\section{Chief Complaint}"), "{latex}");
    assert!(latex.contains("\\section{Vital Signs}"), "{latex}");
    assert!(latex.contains("BP & 120/80"), "{latex}");
}

// ── Tagged report scenarios ──────────────────────────────────────────────────

#[test]
fn synthesized_report_renders_headers_lists_and_pairs() {
    let report = "\
MEDICAL REPORT

**SECTION 1: PATIENT PARTICULARS**
Name: John Tan
NRIC: S7654321B

**SECTION 2: MEDICATIONS**
**Current Prescriptions**
* Amlodipine: 5mg daily
* Review in two weeks

Patient counselled on adherence.
";
    let cfg = ConversionConfig::builder()
        .generated_at("2026-08-27 09:00 UTC")
        .build()
        .unwrap();
    let output = convert_text(report, &cfg);
    assert_latex_quality(&output.latex, "synthesized report");

    let latex = &output.latex;
    // Report preamble machinery.
    assert!(latex.contains("\\usepackage{seqsplit}"), "{latex}");
    assert!(latex.contains("\\tableofcontents"), "{latex}");

    // Headers.
    assert!(latex.contains("\\section{SECTION 1: PATIENT PARTICULARS}"), "{latex}");
    assert!(latex.contains("\\subsection{Current Prescriptions}"), "{latex}");

    // Redundant title suppressed.
    assert!(!latex.contains("\nMEDICAL REPORT\n"), "{latex}");

    // Key/value pairs in bold, bullet pairs in a list.
    assert!(latex.contains("\\textbf{Name:} John Tan"), "{latex}");
    assert!(latex.contains("\\item \\textbf{Amlodipine:} 5mg daily"), "{latex}");
    assert!(latex.contains("\\item Review in two weeks"), "{latex}");

    // Identifier breaking.
    assert!(latex.contains("\\seqsplit{S7654321B}"), "{latex}");

    // Footer timestamp.
    assert!(latex.contains("Generated on 2026-08-27 09:00 UTC."), "{latex}");
}

#[test]
fn long_report_values_wrap_to_parbox() {
    let long = "assessment pending further imaging and specialist review of the prior records";
    let report = format!("**SECTION 1: ASSESSMENT**\nSummary: {long}");
    let cfg = ConversionConfig::builder()
        .shape(SourceShape::TaggedReport)
        .build()
        .unwrap();
    let latex = convert_text(&report, &cfg).latex;
    assert!(latex.contains("\\noindent\\textbf{Summary:} \\\\"), "{latex}");
    assert!(latex.contains(&format!("\\parbox{{\\textwidth}}{{{long}}}")), "{latex}");
}

#[test]
fn escaping_is_stable_over_rendered_output() {
    // Rendering twice must not double-escape the checkbox macros.
    let once = convert_text("SECTION 1: Q\nAnswered? M No", &config()).latex;
    assert!(once.contains("\\checkbox~No"), "{once}");
    assert!(!once.contains("\\textbackslash{}checkbox"), "{once}");
}

// ── File and batch entry points ──────────────────────────────────────────────

#[tokio::test]
async fn convert_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("visit.txt");
    let output = dir.path().join("visit.tex");
    tokio::fs::write(&input, "SECTION 1: VISIT\nReason: follow-up")
        .await
        .unwrap();

    let stats = convert_file(&input, &output, &config()).await.unwrap();
    assert_eq!(stats.sections, 1);

    let latex = tokio::fs::read_to_string(&output).await.unwrap();
    assert_latex_quality(&latex, "convert_file");
    assert!(latex.contains("Reason & follow-up"));
}

#[tokio::test]
async fn batch_conversion_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tex");
    tokio::fs::write(dir.path().join("good.txt"), "SECTION 1: OK\nName: A")
        .await
        .unwrap();
    // A directory with a .txt name forces a per-document read failure
    // without affecting the sibling document.
    tokio::fs::create_dir(dir.path().join("bad.txt")).await.unwrap();

    let batch = convert_dir(dir.path(), &out, &config()).await.unwrap();
    assert_eq!(batch.stats.total, 2);
    assert_eq!(batch.stats.succeeded, 1);
    assert_eq!(batch.stats.failed, 1);

    let good = batch.documents.iter().find(|d| d.input.ends_with("good.txt")).unwrap();
    assert!(good.succeeded());
    let bad = batch.documents.iter().find(|d| d.input.ends_with("bad.txt")).unwrap();
    assert!(!bad.succeeded());
    assert!(out.join("good.tex").exists());
}

#[tokio::test]
async fn streaming_batch_yields_every_document() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("tex");
    for name in ["a", "b", "c"] {
        tokio::fs::write(dir.path().join(format!("{name}.txt")), "SECTION 1: X\nk: v")
            .await
            .unwrap();
    }

    let results: Vec<_> = convert_dir_stream(dir.path(), &out, &config())
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|r| r.succeeded()));
    for name in ["a", "b", "c"] {
        assert!(out.join(format!("{name}.tex")).exists());
    }
}
