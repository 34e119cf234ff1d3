//! Glyphdiff Text Comparison CLI
//!
//! Compares OCR transcriptions and manuscript witnesses, optionally
//! correcting similarity for chance agreement under a confusion matrix.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use glyphdiff::compare::{compare_batch, compare_texts};
use glyphdiff::confusion::{build_confusion_matrix, load_confusion_matrix, save_confusion_matrix};
use glyphdiff::models::{ComparisonParams, DiffSettings, Granularity, NormalizationOptions};
use glyphdiff::output::{
    print_operations, print_summary, write_diff_html_file, write_json_batch, write_json_file,
    write_operations_csv_file,
};

#[derive(Parser)]
#[command(name = "glyphdiff")]
#[command(about = "Bias-aware comparison of OCR transcriptions and manuscript witnesses")]
#[command(version)]
struct Cli {
    /// Log level: trace, debug, info, warn, error
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for comparison results
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Full result as JSON
    Json,
    /// Edit script as CSV
    Csv,
    /// Self-contained HTML diff view
    Html,
}

/// Comparison unit (CLI version, mirrors models::Granularity)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliGranularity {
    /// Whitespace-delimited words
    Word,
    /// Individual characters (default)
    Character,
}

impl From<CliGranularity> for Granularity {
    fn from(granularity: CliGranularity) -> Self {
        match granularity {
            CliGranularity::Word => Granularity::Word,
            CliGranularity::Character => Granularity::Character,
        }
    }
}

/// Normalization and diff flags shared by the comparison commands.
///
/// Flags left unset inherit from ComparisonParams::default().
#[derive(Args, Debug)]
struct ComparisonArgs {
    /// Comparison unit [default: character]
    #[arg(long, value_enum)]
    granularity: Option<CliGranularity>,

    /// Fold ligatures (æ → ae, ﬁ → fi)
    #[arg(long)]
    fold_ligatures: bool,

    /// Fold logograms (& → and, ⁊ → et)
    #[arg(long)]
    fold_logograms: bool,

    /// Fold archaic letters (ſ → s, ꝛ → r)
    #[arg(long)]
    fold_archaic: bool,

    /// Rewrite uu / vv as w
    #[arg(long)]
    normalize_uvw: bool,

    /// Treat u and v as the same letter
    #[arg(long)]
    fold_u_to_v: bool,

    /// Treat i and j as the same letter
    #[arg(long)]
    fold_j_to_i: bool,

    /// Compare letter case [default: true]
    #[arg(long, action = clap::ArgAction::Set)]
    keep_capitalization: Option<bool>,

    /// Compare punctuation [default: true]
    #[arg(long, action = clap::ArgAction::Set)]
    keep_punctuation: Option<bool>,

    /// Compare whitespace [default: false]
    #[arg(long, action = clap::ArgAction::Set)]
    keep_whitespace: Option<bool>,

    /// Collapse whitespace runs to one space [default: false]
    #[arg(long, action = clap::ArgAction::Set)]
    collapse_whitespace: Option<bool>,

    /// Abandon a diff after this many milliseconds
    #[arg(long)]
    diff_timeout_ms: Option<u64>,

    /// Skip the semantic cleanup of character diffs
    #[arg(long)]
    no_semantic_cleanup: bool,

    /// Confusion matrix JSON for bias-aware scores
    #[arg(long)]
    confusion_matrix: Option<PathBuf>,
}

impl ComparisonArgs {
    fn to_params(&self) -> ComparisonParams {
        // Start with library defaults and overlay what the user set
        let defaults = ComparisonParams::default();
        let o = defaults.options;

        ComparisonParams {
            granularity: self
                .granularity
                .map(Granularity::from)
                .unwrap_or(defaults.granularity),
            options: NormalizationOptions {
                fold_ligatures: self.fold_ligatures || o.fold_ligatures,
                fold_logograms: self.fold_logograms || o.fold_logograms,
                fold_archaic_letters: self.fold_archaic || o.fold_archaic_letters,
                normalize_uv_w: self.normalize_uvw || o.normalize_uv_w,
                fold_u_to_v: self.fold_u_to_v || o.fold_u_to_v,
                fold_j_to_i: self.fold_j_to_i || o.fold_j_to_i,
                keep_capitalization: self.keep_capitalization.unwrap_or(o.keep_capitalization),
                keep_punctuation: self.keep_punctuation.unwrap_or(o.keep_punctuation),
                keep_whitespace: self.keep_whitespace.unwrap_or(o.keep_whitespace),
                collapse_whitespace: self.collapse_whitespace.unwrap_or(o.collapse_whitespace),
            },
            diff: DiffSettings {
                timeout_ms: self.diff_timeout_ms.or(defaults.diff.timeout_ms),
                semantic_cleanup: !self.no_semantic_cleanup && defaults.diff.semantic_cleanup,
            },
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two texts
    Compare {
        /// Reference text (ground truth or first witness)
        #[arg(long)]
        text1: PathBuf,

        /// Text to compare against the reference
        #[arg(long)]
        text2: PathBuf,

        /// Output file path (omit to print the summary only)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, csv (edit script), or html
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,

        #[command(flatten)]
        comparison: ComparisonArgs,

        /// Suppress progress output
        #[arg(long)]
        quiet: bool,

        /// Print first N edit operations to console
        #[arg(long)]
        show_ops: Option<usize>,
    },

    /// Compare one reference text against several witnesses in parallel
    Batch {
        /// Reference text
        #[arg(long)]
        reference: PathBuf,

        /// Witness texts
        #[arg(long, num_args = 1.., required = true)]
        witnesses: Vec<PathBuf>,

        /// Output JSON path
        #[arg(long)]
        output: PathBuf,

        #[command(flatten)]
        comparison: ComparisonArgs,

        /// Suppress progress output
        #[arg(long)]
        quiet: bool,
    },

    /// Build a confusion matrix from a ground truth and its transcription
    BuildMatrix {
        /// Ground-truth text
        #[arg(long)]
        truth: PathBuf,

        /// Transcription of the same text
        #[arg(long)]
        transcription: PathBuf,

        /// Output JSON path
        #[arg(long)]
        output: PathBuf,

        /// Comment stored alongside the matrix
        #[arg(long)]
        comment: Option<String>,
    },

    /// Benchmark diff and weight-table performance
    Benchmark {
        /// Number of iterations
        #[arg(long, default_value = "100")]
        iterations: usize,

        /// Text size in characters
        #[arg(long, default_value = "2000")]
        size: usize,
    },
}

fn init_logging(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn read_text(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e).into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Compare {
            text1,
            text2,
            output,
            format,
            comparison,
            quiet,
            show_ops,
        } => {
            let params = comparison.to_params();
            let confusion = match &comparison.confusion_matrix {
                Some(path) => Some(load_confusion_matrix(path)?),
                None => None,
            };

            let content1 = read_text(&text1)?;
            let content2 = read_text(&text2)?;
            info!(
                "Comparing {} and {} at {:?} granularity",
                text1.display(),
                text2.display(),
                params.granularity
            );

            let result = compare_texts(&content1, &content2, &params, confusion.as_ref(), !quiet);

            if let Some(output) = &output {
                match format {
                    OutputFormat::Json => write_json_file(&result, output)?,
                    OutputFormat::Csv => write_operations_csv_file(&result.operations, output)?,
                    OutputFormat::Html => write_diff_html_file(&result, output)?,
                }
            }

            if !quiet {
                print_summary(&result);
                if let Some(output) = &output {
                    eprintln!("\nOutput: {}", output.display());
                }
            }

            if let Some(limit) = show_ops {
                println!("\n=== Edit Operations ===");
                print_operations(&result.operations, Some(limit));
            }
        }

        Commands::Batch {
            reference,
            witnesses,
            output,
            comparison,
            quiet,
        } => {
            let params = comparison.to_params();
            let confusion = match &comparison.confusion_matrix {
                Some(path) => Some(load_confusion_matrix(path)?),
                None => None,
            };

            let reference_text = read_text(&reference)?;
            let witness_texts = witnesses
                .iter()
                .map(|path| read_text(path))
                .collect::<Result<Vec<_>, _>>()?;

            if !quiet {
                eprintln!(
                    "Comparing {} against {} witnesses...",
                    reference.display(),
                    witness_texts.len()
                );
            }
            let results = compare_batch(
                &reference_text,
                &witness_texts,
                &params,
                confusion.as_ref(),
                !quiet,
            );

            let mut file = std::fs::File::create(&output)?;
            write_json_batch(&results, &mut file)?;

            if !quiet {
                println!("\n=== Batch Summary ===");
                for (path, result) in witnesses.iter().zip(&results) {
                    println!(
                        "  {}: distance {}  S_obs {:.3}",
                        path.display(),
                        result.report.distance,
                        result.report.s_obs
                    );
                }
                eprintln!("\nOutput: {}", output.display());
            }
        }

        Commands::BuildMatrix {
            truth,
            transcription,
            output,
            comment,
        } => {
            let truth_text = read_text(&truth)?;
            let transcription_text = read_text(&transcription)?;

            let matrix =
                build_confusion_matrix(&truth_text, &transcription_text, &DiffSettings::default())?;
            let comment = comment.unwrap_or_else(|| {
                format!(
                    "Built from {} and {}",
                    truth.display(),
                    transcription.display()
                )
            });
            save_confusion_matrix(&matrix, &comment, &output)?;

            println!("=== Confusion Matrix ===");
            println!("Glyphs: {}", matrix.len());
            println!("Correspondences: {}", matrix.total());
            println!("Output: {}", output.display());
        }

        Commands::Benchmark { iterations, size } => {
            run_benchmark(iterations, size);
        }
    }

    Ok(())
}

/// Run diff and weight-table benchmarks to measure performance.
fn run_benchmark(iterations: usize, size: usize) {
    use glyphdiff::confusion::{glyph_frequencies, to_probability_matrix};
    use glyphdiff::diff::diff_chars;
    use glyphdiff::weights::weight_table;
    use std::time::Instant;

    println!("=== Diff Benchmark ===");
    println!("Iterations: {}", iterations);
    println!("Text size: {}", size);

    let alphabet: Vec<char> = "abcdefghijklmnopqrstuvwxyz ".chars().collect();
    let text: String = (0..size).map(|i| alphabet[(i * 7) % alphabet.len()]).collect();
    let noisy: String = text
        .chars()
        .enumerate()
        .map(|(i, c)| if i % 10 < 8 { c } else { 'x' })
        .collect();
    let unrelated: String = (0..size).map(|i| alphabet[(i * 11 + 3) % alphabet.len()]).collect();
    let settings = DiffSettings::default();

    let cases = [
        ("Identical texts", &text),
        ("80% match texts", &noisy),
        ("Unrelated texts", &unrelated),
    ];
    for (label, other) in cases {
        println!("\n{}:", label);
        let start = Instant::now();
        for _ in 0..iterations {
            let _ = diff_chars(&text, other, &settings);
        }
        let elapsed = start.elapsed();
        let per_diff = elapsed.as_secs_f64() / iterations as f64;
        println!("  Total time: {:.3}s", elapsed.as_secs_f64());
        println!("  Per diff: {:.3}ms", per_diff * 1000.0);
        println!("  Diffs/sec: {:.0}", 1.0 / per_diff);
    }

    println!("\nWeight table:");
    match build_confusion_matrix(&text, &noisy, &settings) {
        Ok(matrix) => {
            let p = to_probability_matrix(&matrix);
            let frequencies = glyph_frequencies(&text, &noisy);
            let start = Instant::now();
            for _ in 0..iterations {
                let _ = weight_table(&p, &frequencies, matrix.glyphs());
            }
            let elapsed = start.elapsed();
            let per_table = elapsed.as_secs_f64() / iterations as f64;
            println!("  Glyphs: {}", matrix.len());
            println!("  Total time: {:.3}s", elapsed.as_secs_f64());
            println!("  Per table: {:.3}ms", per_table * 1000.0);
        }
        Err(e) => println!("  Skipped: {}", e),
    }
}
