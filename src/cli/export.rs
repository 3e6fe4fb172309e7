//! CLI commands for data export
//!
//! CSV writes transactions in the Ivy Wallet layout so the file can be
//! imported again; JSON and YAML write the whole wallet.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use clap::ValueEnum;

use crate::error::{WalletError, WalletResult};
use crate::export::{export_full_json, export_full_yaml, export_transactions_csv};
use crate::storage::Storage;

/// Export format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// CSV format (transactions only, Ivy Wallet layout)
    Csv,
    /// JSON format (full wallet)
    Json,
    /// YAML format (full wallet, human-readable)
    Yaml,
}

fn write_export<W: Write>(storage: &Storage, writer: W, format: ExportFormat, pretty: bool) -> WalletResult<Option<usize>> {
    match format {
        ExportFormat::Csv => export_transactions_csv(storage, writer).map(Some),
        ExportFormat::Json => export_full_json(storage, writer, pretty).map(|_| None),
        ExportFormat::Yaml => export_full_yaml(storage, writer).map(|_| None),
    }
}

/// Handle the export command; without an output path the data goes to stdout
pub fn handle_export_command(
    storage: &Storage,
    format: ExportFormat,
    output: Option<&Path>,
    pretty: bool,
) -> WalletResult<()> {
    let Some(output) = output else {
        let stdout = io::stdout();
        write_export(storage, stdout.lock(), format, pretty)?;
        return Ok(());
    };

    let file = File::create(output).map_err(|e| {
        WalletError::Export(format!("Failed to create file {}: {}", output.display(), e))
    })?;
    let mut writer = BufWriter::new(file);
    let written = write_export(storage, &mut writer, format, pretty)?;
    writer.flush()?;

    match written {
        Some(count) => println!("Exported {} transactions to: {}", count, output.display()),
        None => println!("Full wallet exported to: {}", output.display()),
    }
    Ok(())
}
