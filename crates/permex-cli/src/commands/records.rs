//! Records command - confirm, list and export human-validated records.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use serde_json::Value;

use permex_core::{ConfirmRequest, ConfirmedRecord, Field, JsonLinesStore, RecordStore, confirm_into};

/// Arguments for the records command.
#[derive(Args)]
pub struct RecordsArgs {
    /// Record store file (default: `store.path` from the configuration)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: RecordsCommand,
}

#[derive(Subcommand)]
enum RecordsCommand {
    /// Store a confirmed record
    Confirm {
        /// Document identifier
        #[arg(long)]
        document_id: String,

        /// JSON file with the validated fields ("-" for stdin)
        #[arg(long)]
        fields: String,
    },

    /// List confirmed records as JSON
    List,

    /// Export confirmed records as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub async fn run(args: RecordsArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let store_path = match args.store {
        Some(path) => path,
        None => super::load_config(config_path)?.store.path,
    };
    let store = JsonLinesStore::new(store_path);

    match args.command {
        RecordsCommand::Confirm {
            document_id,
            fields,
        } => confirm(&store, document_id, &fields),
        RecordsCommand::List => list(&store),
        RecordsCommand::Export { output } => export(&store, output.as_deref()),
    }
}

fn confirm(store: &JsonLinesStore, document_id: String, fields_source: &str) -> anyhow::Result<()> {
    let raw = if fields_source == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(fields_source)?
    };

    let fields: Value = serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("Fields are not valid JSON: {}", e))?;
    let record = confirm_into(store, ConfirmRequest::new(document_id, fields))?;

    println!(
        "{} Confirmed {} in {}",
        style("✓").green(),
        record.document_id,
        store.path().display()
    );
    Ok(())
}

fn list(store: &JsonLinesStore) -> anyhow::Result<()> {
    let records = store.list()?;
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

fn export(store: &JsonLinesStore, output: Option<&Path>) -> anyhow::Result<()> {
    let records = store.list()?;
    let csv = records_to_csv(&records)?;

    match output {
        Some(path) => {
            fs::write(path, csv)?;
            println!(
                "{} Exported {} records to {}",
                style("✓").green(),
                records.len(),
                path.display()
            );
        }
        None => print!("{}", csv),
    }
    Ok(())
}

fn records_to_csv(records: &[ConfirmedRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = vec!["document_id", "confirmed_at"];
    header.extend(Field::ALL.iter().map(|f| f.as_str()));
    header.push("fields");
    wtr.write_record(&header)?;

    for record in records {
        let mut row = vec![record.document_id.clone(), record.confirmed_at.to_rfc3339()];
        row.extend(Field::ALL.iter().map(|f| scalar(record.fields.get(f.as_str()))));
        row.push(serde_json::to_string(&record.fields)?);
        wtr.write_record(&row)?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn scalar(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_csv_columns() {
        let records = vec![ConfirmedRecord::new(
            "doc-1",
            json!({"permit_number": "UE-A-12345/2026", "axle_count": 5, "to_place": null}),
        )];
        let csv = records_to_csv(&records).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "document_id,confirmed_at,permit_number,issue_date,valid_from,valid_until,from_place,to_place,fields"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("doc-1,"));
        assert!(row.contains(",UE-A-12345/2026,,,,,,"));
    }

    #[test]
    fn test_confirm_rejects_blank_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonLinesStore::new(dir.path().join("records.jsonl"));

        let err = confirm_into(&store, ConfirmRequest::new(" ", json!({}))).unwrap_err();
        assert_eq!(err.to_string(), "invalid request: document_id is required");
        assert!(store.list().unwrap().is_empty());
    }
}
