//! Batch processing command for multiple permit files.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use anyhow::Context;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use permex_core::{Field, ParsedRecord, PermexConfig, PermitPipeline, check_upload};

use super::process::{OutputFormat, apply_overrides, format_record};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching input PDFs
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only PDF text extraction
    #[arg(long)]
    text_only: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    /// Position in the matched file list.
    order: usize,
    path: PathBuf,
    record: Option<ParsedRecord>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, args.model_dir.as_deref(), args.text_only);

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut results = process_all(files, &config, args.jobs, args.continue_on_error, &overall_pb).await?;
    results.sort_by_key(|r| r.order);
    overall_pb.finish_with_message("Complete");

    let successful: Vec<_> = results.iter().filter(|r| r.record.is_some()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    if !args.continue_on_error {
        if let Some(first) = failed.first() {
            let message = first.error.as_deref().unwrap_or("unknown error");
            error!("Failed to process {}: {}", first.path.display(), message);
            anyhow::bail!("Processing failed for {}: {}", first.path.display(), message);
        }
    }

    if let Some(output_dir) = &args.output_dir {
        for result in &successful {
            let Some(record) = &result.record else {
                continue;
            };
            let output_name = result
                .path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("permit");
            let output_path = output_dir.join(format!("{}.{}", output_name, args.format.extension()));

            fs::write(&output_path, format_record(record, args.format)?)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Split files across `jobs` blocking workers, each with its own pipeline.
async fn process_all(
    files: Vec<PathBuf>,
    config: &PermexConfig,
    jobs: usize,
    continue_on_error: bool,
    pb: &ProgressBar,
) -> anyhow::Result<Vec<ProcessResult>> {
    let jobs = jobs.clamp(1, files.len());
    let chunk_size = files.len().div_ceil(jobs);
    let stop = Arc::new(AtomicBool::new(false));

    let mut handles = Vec::with_capacity(jobs);
    for (chunk_index, chunk) in files.chunks(chunk_size).enumerate() {
        let chunk: Vec<(usize, PathBuf)> = chunk
            .iter()
            .cloned()
            .enumerate()
            .map(|(i, path)| (chunk_index * chunk_size + i, path))
            .collect();
        let config = config.clone();
        let stop = Arc::clone(&stop);
        let pb = pb.clone();

        handles.push(tokio::task::spawn_blocking(move || {
            let pipeline = PermitPipeline::from_config(&config);
            let mut results = Vec::with_capacity(chunk.len());

            for (order, path) in chunk {
                if stop.load(Ordering::Relaxed) {
                    break;
                }

                let file_start = Instant::now();
                let outcome = process_single_file(&path, &pipeline);
                let processing_time_ms = file_start.elapsed().as_millis() as u64;

                let (record, error) = match outcome {
                    Ok(record) => (Some(record), None),
                    Err(e) => {
                        warn!("Failed to process {}: {}", path.display(), e);
                        if !continue_on_error {
                            stop.store(true, Ordering::Relaxed);
                        }
                        (None, Some(e.to_string()))
                    }
                };

                results.push(ProcessResult {
                    order,
                    path,
                    record,
                    error,
                    processing_time_ms,
                });
                pb.inc(1);
            }
            results
        }));
    }

    let mut results = Vec::with_capacity(files.len());
    for handle in handles {
        results.extend(handle.await?);
    }
    Ok(results)
}

fn process_single_file(path: &Path, pipeline: &PermitPipeline) -> anyhow::Result<ParsedRecord> {
    let data = fs::read(path)?;
    check_upload(&data).context("file is empty")?;
    Ok(pipeline.run(&data)?)
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "permit_number",
        "issue_date",
        "valid_from",
        "valid_until",
        "from_place",
        "to_place",
        "license_plates",
        "axle_count",
        "text_source",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result.path.file_name().and_then(|s| s.to_str()).unwrap_or("");
        let time = result.processing_time_ms.to_string();

        if let Some(record) = &result.record {
            let field = |f: Field| record.field(f).unwrap_or("").to_string();
            wtr.write_record([
                filename.to_string(),
                "success".to_string(),
                field(Field::PermitNumber),
                field(Field::IssueDate),
                field(Field::ValidFrom),
                field(Field::ValidUntil),
                field(Field::FromPlace),
                field(Field::ToPlace),
                record.license_plates.join(" "),
                record.axle_count.to_string(),
                serde_json::to_value(record.text_source)?
                    .as_str()
                    .unwrap_or("")
                    .to_string(),
                record.warnings.len().to_string(),
                time,
                String::new(),
            ])?;
        } else {
            let mut row = vec![filename.to_string(), "error".to_string()];
            row.extend(std::iter::repeat_n(String::new(), 10));
            row.push(time);
            row.push(result.error.clone().unwrap_or_default());
            wtr.write_record(&row)?;
        }
    }

    wtr.flush()?;
    Ok(())
}
