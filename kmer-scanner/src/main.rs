use clap::{Args, Parser, Subcommand};
use kmer_features::alphabet::{AlphabetId, AlphabetRegistry};
use kmer_features::error::KmerError;
use kmer_features::model::KmerModel;
use kmer_features::score::ScoreMethod;
use kmer_features::sequence::{records_from_dataframe, string_column};
use kmer_features::vectorize::VectorizerConfig;
use log::{info, warn, LevelFilter};
use polars::prelude::*;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum ScannerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("{0}")]
    Kmer(#[from] KmerError),

    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),
}

#[derive(Parser)]
#[command(
    name = "kmer-scanner",
    about = "Fits reduced-alphabet k-mer class scores on labeled sequences and applies them to new ones",
    long_about = "A tool for discriminative k-mer analysis of protein sequences. \
                  Sequences are reduced into a chosen alphabet, split into k-mers and scored per class; \
                  the fitted model can then score unseen sequences.",
    version,
    after_help = "Example usage:\n    \
                  kmer-scanner fit train.csv model.cbor --alphabet hydro -k 4 --scores-out scores.parquet\n    \
                  kmer-scanner apply model.cbor query.csv predictions.csv",
    color = clap::ColorChoice::Always
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score k-mers per class and save the fitted model
    Fit(FitCommand),
    /// Score new sequences with a fitted model
    Apply(ApplyCommand),
}

#[derive(Args, Debug)]
struct SequenceColumns {
    /// Column holding sequence identifiers
    #[arg(long, default_value = "id")]
    id_column: String,

    /// Column holding sequences
    #[arg(long, default_value = "sequence")]
    sequence_column: String,
}

#[derive(Args, Debug)]
struct FitCommand {
    /// Path to input data file (CSV format) with identifier, sequence and label columns
    #[arg(value_name = "DATA_FILE")]
    data_file: String,

    /// Path for the fitted model
    #[arg(value_name = "MODEL_FILE")]
    model_file: String,

    /// Alphabet index (0-5), name or label; "None" for the full alphabet
    #[arg(long, default_value = "0")]
    alphabet: AlphabetId,

    /// K-mer length
    #[arg(short, default_value_t = 3)]
    k: usize,

    /// Scoring method: default, bg_only or both
    #[arg(long, default_value = "default")]
    method: ScoreMethod,

    /// Background sequences (CSV format), required by bg_only and both
    #[arg(long, value_name = "BACKGROUND_FILE")]
    background: Option<String>,

    /// Discard k-mers containing this substring (repeatable)
    #[arg(long)]
    exclude: Vec<String>,

    /// Column holding class labels
    #[arg(long, default_value = "label")]
    label_column: String,

    /// Also write the long-form score table (supports .csv or .parquet format)
    #[arg(long, value_name = "SCORES_FILE")]
    scores_out: Option<String>,

    #[command(flatten)]
    columns: SequenceColumns,
}

#[derive(Args, Debug)]
struct ApplyCommand {
    /// Path to a model written by `fit`
    #[arg(value_name = "MODEL_FILE")]
    model_file: String,

    /// Path to input data file (CSV format)
    #[arg(value_name = "DATA_FILE")]
    data_file: String,

    /// Path for output file (supports .csv or .parquet format)
    #[arg(value_name = "OUTPUT_FILE")]
    output_file: String,

    #[command(flatten)]
    columns: SequenceColumns,
}

fn read_table(path: &str) -> Result<DataFrame, ScannerError> {
    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()?
        .collect()?;
    Ok(df)
}

fn write_table(df: &mut DataFrame, path: &str) -> Result<(), ScannerError> {
    // Create output directory if it doesn't exist
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    if path.ends_with(".parquet") {
        ParquetWriter::new(file).finish(df)?;
    } else {
        CsvWriter::new(file).include_header(true).finish(df)?;
    }
    Ok(())
}

fn fit(registry: &AlphabetRegistry, command: FitCommand) -> Result<(), ScannerError> {
    let df = read_table(&command.data_file)?;
    let records = records_from_dataframe(
        &df,
        &command.columns.id_column,
        &command.columns.sequence_column,
    )?;
    let labels = string_column(&df, &command.label_column)?;
    info!("{} labeled sequences loaded", records.len());

    let background = match &command.background {
        Some(path) => {
            let bg = read_table(path)?;
            Some(records_from_dataframe(
                &bg,
                &command.columns.id_column,
                &command.columns.sequence_column,
            )?)
        }
        None => None,
    };

    let mut config = VectorizerConfig::new(command.alphabet, command.k);
    config.exclude = command.exclude;

    let model = KmerModel::fit(
        registry,
        config,
        command.method,
        &records,
        &labels,
        background.as_deref(),
    )?;

    model.write_to(BufWriter::new(File::create(&command.model_file)?))?;

    if let Some(scores_out) = &command.scores_out {
        let mut scores = model.scores.to_long_dataframe()?;
        write_table(&mut scores, scores_out)?;
    }
    Ok(())
}

fn apply(registry: &AlphabetRegistry, command: ApplyCommand) -> Result<(), ScannerError> {
    let model = KmerModel::read_from(BufReader::new(File::open(&command.model_file)?))?;
    let df = read_table(&command.data_file)?;
    let records = records_from_dataframe(
        &df,
        &command.columns.id_column,
        &command.columns.sequence_column,
    )?;
    info!("{} sequences to score", records.len());

    let scores = model.apply(registry, &records)?;
    for (id, error) in &scores.failures {
        warn!("sequence {} was not scored: {}", id, error);
    }

    let mut results = scores.to_dataframe()?;
    write_table(&mut results, &command.output_file)?;
    Ok(())
}

fn main() -> Result<(), ScannerError> {
    let start_time = std::time::Instant::now();

    let cli = Cli::parse();

    let level = if cli.quiet {
        LevelFilter::Warn
    } else if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)?;

    let registry = AlphabetRegistry::builtin();
    match cli.command {
        Commands::Fit(command) => fit(&registry, command)?,
        Commands::Apply(command) => apply(&registry, command)?,
    }

    let elapsed = start_time.elapsed();
    info!(
        "Total execution time: {:.4} minutes",
        elapsed.as_secs_f64() / 60.0
    );

    Ok(())
}
