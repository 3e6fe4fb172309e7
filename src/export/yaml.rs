//! YAML Export functionality
//!
//! Same content as the JSON export, for reading by humans.

use std::io::Write;

use crate::error::{WalletError, WalletResult};
use crate::export::json::FullExport;
use crate::storage::Storage;

/// Export the full wallet to YAML format
pub fn export_full_yaml<W: Write>(storage: &Storage, mut writer: W) -> WalletResult<()> {
    let export = FullExport::from_storage(storage)?;

    writeln!(writer, "# wallet-cli full export")?;
    writeln!(writer, "# Generated: {}", export.exported_at)?;
    writeln!(writer, "# App Version: {}", export.app_version)?;
    writeln!(writer)?;

    serde_yaml::to_writer(writer, &export).map_err(|e| WalletError::Export(e.to_string()))?;
    Ok(())
}

/// Read back a YAML export
pub fn read_full_yaml(yaml_str: &str) -> WalletResult<FullExport> {
    let export: FullExport =
        serde_yaml::from_str(yaml_str).map_err(|e| WalletError::Import(e.to_string()))?;
    export.validate().map_err(WalletError::Import)?;
    Ok(export)
}
