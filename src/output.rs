//! Output formatting for comparison results (JSON, CSV, HTML diff view).

use crate::models::{BiasFlag, ComparisonResult, EditOperation, Granularity};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write comparison result as JSON.
pub fn write_json<W: Write>(result: &ComparisonResult, writer: &mut W) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(result)?;
    writer.write_all(json.as_bytes())?;
    Ok(())
}

/// Write comparison result as JSON to a file.
pub fn write_json_file(result: &ComparisonResult, path: &Path) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_json(result, &mut file)
}

/// Write several results as one JSON array.
pub fn write_json_batch<W: Write>(
    results: &[ComparisonResult],
    writer: &mut W,
) -> Result<(), OutputError> {
    let json = serde_json::to_string_pretty(results)?;
    writer.write_all(json.as_bytes())?;
    Ok(())
}

fn csv_field(text: &str) -> String {
    if text.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}

/// Write the edit script as CSV, one operation per row.
pub fn write_operations_csv<W: Write>(
    operations: &[EditOperation],
    writer: &mut W,
) -> Result<(), OutputError> {
    writeln!(writer, "index,type,text1,text2")?;

    for (i, op) in operations.iter().enumerate() {
        writeln!(
            writer,
            "{},{},{},{}",
            i,
            op.kind(),
            csv_field(op.text1().unwrap_or("")),
            csv_field(op.text2().unwrap_or(""))
        )?;
    }

    Ok(())
}

/// Write the edit script as CSV to a file.
pub fn write_operations_csv_file(
    operations: &[EditOperation],
    path: &Path,
) -> Result<(), OutputError> {
    let mut file = std::fs::File::create(path)?;
    write_operations_csv(operations, &mut file)
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2}%", v))
}

fn score(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.3}", v))
}

/// Write a summary report to stdout.
pub fn print_summary(result: &ComparisonResult) {
    let report = &result.report;
    let unit = match result.parameters.granularity {
        Granularity::Word => "words",
        Granularity::Character => "characters",
    };

    println!("\n=== Comparison Summary ===");
    println!("Version: {}", result.version);
    println!();
    println!("Text 1: {} {}", report.length1, unit);
    println!("Text 2: {} {}", report.length2, unit);
    println!();
    println!("Parameters:");
    println!("  Granularity: {:?}", result.parameters.granularity);
    let o = &result.parameters.options;
    println!(
        "  Folds: ligatures={} logograms={} archaic={} uvw={} u→v={} j→i={}",
        o.fold_ligatures,
        o.fold_logograms,
        o.fold_archaic_letters,
        o.normalize_uv_w,
        o.fold_u_to_v,
        o.fold_j_to_i
    );
    println!(
        "  Keep: capitalization={} punctuation={} whitespace={} (collapse={})",
        o.keep_capitalization, o.keep_punctuation, o.keep_whitespace, o.collapse_whitespace
    );
    println!();
    println!("Results:");
    println!(
        "  Operations: {} ({} changes)",
        result.operations.len(),
        result.operations.iter().filter(|op| op.is_change()).count()
    );
    println!("  Edit distance: {}", report.distance);
    println!("  S_obs: {:.3}", report.s_obs);
    if report.s_baseline.is_some() {
        println!("  S_baseline: {}", score(report.s_baseline));
        println!("  S_corr: {}", score(report.s_corr));
        println!("  S_adj: {}", score(report.s_adj));
        match report.bias_flag {
            Some(BiasFlag::Inflated) => println!("  Chance agreement inflates S_obs"),
            Some(BiasFlag::Deflated) => println!("  Chance agreement deflates S_obs"),
            Some(BiasFlag::Neutral) | None => {}
        }
    }
    match result.parameters.granularity {
        Granularity::Character => {
            println!("  CER: {}", percent(report.cer));
            println!("  NED: {}", percent(report.ned));
        }
        Granularity::Word => println!("  WER: {}", percent(report.wer)),
    }

    if let Some(metrics) = &result.word_metrics {
        println!();
        println!("Words:");
        println!(
            "  Substitutions: {}  Deletions: {}  Insertions: {}",
            metrics.substitutions, metrics.deletions, metrics.insertions
        );
        println!("  Jaccard similarity: {:.2}%", metrics.jaccard_similarity);
        println!("  Cosine similarity: {:.2}%", metrics.cosine_similarity);
        println!("  Vocabulary overlap: {:.2}%", metrics.vocabulary_overlap);
        println!(
            "  Type-token ratio: {:.2}% / {:.2}%",
            metrics.type_token_ratio1, metrics.type_token_ratio2
        );
    }

    if let Some(stats) = &result.character_stats {
        let caps = &stats.capitalized_words;
        if caps.removed + caps.added + caps.unchanged > 0 {
            println!();
            println!(
                "Capitalized words: {} unchanged, {} removed, {} added",
                caps.unchanged, caps.removed, caps.added
            );
        }
    }

    if let Some(changes) = &result.case_changes {
        if changes.total > 0 {
            println!();
            println!(
                "Case changes: {} ({} to lower, {} to upper)",
                changes.total, changes.to_lower, changes.to_upper
            );
        }
    }

    let variants = &result.variants;
    if !variants.change_tallies.is_empty() {
        println!();
        println!("Variant changes:");
        for (change, count) in &variants.change_tallies {
            println!("  {}: {}", change, count);
        }
    }

    if !result.glyph_error_rates.is_empty() {
        println!();
        println!("Least reliable glyphs:");
        for rate in result.glyph_error_rates.iter().take(5) {
            println!("  {:?}: {:.1}% error", rate.glyph, rate.error_rate * 100.0);
        }
    }
}

/// Format an operation as a human-readable string.
pub fn format_operation(op: &EditOperation) -> String {
    match op {
        EditOperation::Equal { text } => format!("  = {:?}", text),
        EditOperation::Deletion { text } => format!("  - {:?}", text),
        EditOperation::Insertion { text } => format!("  + {:?}", text),
        EditOperation::Substitution { text1, text2 } => format!("  ~ {:?} → {:?}", text1, text2),
    }
}

/// Print operations in a human-readable format.
pub fn print_operations(operations: &[EditOperation], limit: Option<usize>) {
    let to_print = match limit {
        Some(n) => &operations[..n.min(operations.len())],
        None => operations,
    };

    for op in to_print {
        println!("{}", format_operation(op));
    }

    if let Some(n) = limit {
        if operations.len() > n {
            println!("... and {} more operations", operations.len() - n);
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("<br>"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the edit script as a self-contained HTML page.
///
/// Presentation only; nothing in the comparison pipeline depends on it.
pub fn generate_diff_html(result: &ComparisonResult) -> String {
    let separator = match result.parameters.granularity {
        Granularity::Word if !result.parameters.options.keep_whitespace => " ",
        _ => "",
    };

    let body: Vec<String> = result
        .operations
        .iter()
        .map(|op| match op {
            EditOperation::Equal { text } => escape_html(text),
            EditOperation::Deletion { text } => format!("<del>{}</del>", escape_html(text)),
            EditOperation::Insertion { text } => format!("<ins>{}</ins>", escape_html(text)),
            EditOperation::Substitution { text1, text2 } => format!(
                "<span class=\"sub\"><del>{}</del><ins>{}</ins></span>",
                escape_html(text1),
                escape_html(text2)
            ),
        })
        .collect();

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>glyphdiff {version}</title>
    <style>
        body {{ font-family: serif; max-width: 60rem; margin: 2rem auto; line-height: 1.8; }}
        del {{ background-color: #fecaca; text-decoration: line-through; }}
        ins {{ background-color: #bbf7d0; text-decoration: none; }}
        .sub {{ border-bottom: 1px dotted #6b7280; }}
        .scores {{ color: #4b5563; font-family: sans-serif; font-size: 0.9rem; }}
    </style>
</head>
<body>
    <p class="scores">distance {distance} &middot; S_obs {s_obs:.3} &middot; S_corr {s_corr} &middot; S_adj {s_adj}</p>
    <div class="diff">{body}</div>
</body>
</html>"##,
        version = result.version,
        distance = result.report.distance,
        s_obs = result.report.s_obs,
        s_corr = score(result.report.s_corr),
        s_adj = score(result.report.s_adj),
        body = body.join(separator),
    )
}

/// Write the HTML diff view to a file.
pub fn write_diff_html_file(result: &ComparisonResult, path: &Path) -> Result<(), OutputError> {
    std::fs::write(path, generate_diff_html(result))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compare::compare_texts;
    use crate::models::ComparisonParams;

    #[test]
    fn test_csv_quotes_fields() {
        let ops = vec![
            EditOperation::Equal {
                text: "a,b".to_string(),
            },
            EditOperation::Insertion {
                text: "say \"hi\"".to_string(),
            },
        ];
        let mut buf = Vec::new();
        write_operations_csv(&ops, &mut buf).unwrap();
        let csv = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "index,type,text1,text2");
        assert_eq!(lines[1], "0,equal,\"a,b\",\"a,b\"");
        assert_eq!(lines[2], "1,insertion,,\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_json_round_trip() {
        let result = compare_texts("cat", "cot", &ComparisonParams::default(), None, false);
        let mut buf = Vec::new();
        write_json(&result, &mut buf).unwrap();
        let back: ComparisonResult = serde_json::from_slice(&buf).unwrap();
        assert_eq!(back.operations, result.operations);
        assert_eq!(back.report.distance, 1);
    }

    #[test]
    fn test_format_operation() {
        let op = EditOperation::Substitution {
            text1: "a".to_string(),
            text2: "o".to_string(),
        };
        assert_eq!(format_operation(&op), "  ~ \"a\" → \"o\"");
    }

    #[test]
    fn test_html_escapes_text() {
        let result = compare_texts("a<b", "a>b", &ComparisonParams::default(), None, false);
        let html = generate_diff_html(&result);
        assert!(html.contains("<del>&lt;</del><ins>&gt;</ins>"));
        assert!(!html.contains("a<b"));
    }
}
