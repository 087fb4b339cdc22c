//! Process command - extract permit data from a single PDF.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use permex_core::{Field, ParsedRecord, PermexConfig, PermitPipeline, check_upload};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only PDF text extraction
    #[arg(long)]
    text_only: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    apply_overrides(&mut config, args.model_dir.as_deref(), args.text_only);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let data = fs::read(&args.input)?;
    check_upload(&data)
        .with_context(|| format!("Input file is empty: {}", args.input.display()))?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Extracting permit data...");

    // The OCR engine is not Send, so the whole pipeline lives on the blocking thread
    let record = tokio::task::spawn_blocking(move || PermitPipeline::from_config(&config).run(&data))
        .await??;

    pb.finish_and_clear();

    let output = format_record(&record, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Command-line flags that take precedence over the config file.
pub fn apply_overrides(config: &mut PermexConfig, model_dir: Option<&Path>, text_only: bool) {
    if let Some(dir) = model_dir {
        config.ocr.model_dir = dir.to_path_buf();
    }
    if text_only {
        config.acquisition.enable_ocr = false;
    }
}

pub fn format_record(record: &ParsedRecord, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)?),
        OutputFormat::Text => Ok(format_text(record)),
    }
}

fn format_text(record: &ParsedRecord) -> String {
    let value = |field: Field| record.field(field).unwrap_or("-");
    let mut output = String::new();

    output.push_str(&format!("Permit: {}\n", value(Field::PermitNumber)));
    output.push_str(&format!("Issued: {}\n", value(Field::IssueDate)));
    output.push_str(&format!(
        "Valid:  {} - {}\n",
        value(Field::ValidFrom),
        value(Field::ValidUntil)
    ));
    output.push_str(&format!(
        "From:   {}\nTo:     {}\n",
        value(Field::FromPlace),
        value(Field::ToPlace)
    ));
    output.push_str(&format!("Plates: {}\n", record.license_plates.join(", ")));
    output.push('\n');

    output.push_str(&format!("Axles ({}):\n", record.axle_count));
    for axle in &record.axles {
        output.push_str(&format!(
            "  {:>2} {:?}{} {} t\n",
            axle.index,
            axle.axle_type,
            if axle.driven { " (driven)" } else { "" },
            axle.load_tons
        ));
    }
    for group in &record.axle_groups {
        output.push_str(&format!("  {} {} t", group.group_code, group.load_tons));
        if !group.further.is_empty() {
            let further: Vec<String> = group.further.iter().map(|d| d.to_string()).collect();
            output.push_str(&format!(" ({})", further.join(", ")));
        }
        output.push('\n');
    }
    output.push('\n');

    output.push_str(&format!("Roads: {}\n", record.roads.join(", ")));
    for segment in &record.routes {
        output.push_str(&format!("  {} km {}\n", segment.road, segment.km));
    }

    if !record.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &record.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use permex_core::{PermitExtractor, PermitParser, TextSource};

    #[test]
    fn test_text_format() {
        let record = PermitParser::new().parse(
            "UE-A-12345/2026\n2026.01.12\nTengelyadatok\n1 A 8,000\nVV 19,0 19,0\n",
            TextSource::Native,
        );
        let text = format_text(&record);

        assert!(text.contains("Permit: UE-A-12345/2026"));
        assert!(text.contains("Issued: 2026.01.12"));
        assert!(text.contains("From:   -"));
        assert!(text.contains("   1 A 8.000 t"));
        assert!(text.contains("  VV 19.0 t (19.0)"));
        assert!(text.contains("Could not extract to_place"));
    }

    #[test]
    fn test_overrides() {
        let mut config = PermexConfig::default();
        apply_overrides(&mut config, Some(Path::new("/opt/models")), true);
        assert_eq!(config.ocr.model_dir, PathBuf::from("/opt/models"));
        assert!(!config.acquisition.enable_ocr);
    }
}
