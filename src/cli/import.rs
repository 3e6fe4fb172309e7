//! CLI command handler for CSV import
//!
//! Imports transactions exported by other finance apps. Accounts and
//! categories named in the file are created on the fly and rows already
//! present in the wallet are skipped.

use std::path::Path;

use crate::error::{WalletError, WalletResult};
use crate::services::{ImportService, ImportType};
use crate::storage::Storage;

/// Print the supported import formats
pub fn print_import_formats() {
    println!("Supported import formats:");
    for import_type in ImportType::ALL {
        let name = match import_type {
            ImportType::Ivy => "ivy",
            ImportType::MoneyManager => "money-manager",
            ImportType::WalletByBudgetBakers => "budgetbakers",
            ImportType::Spendee => "spendee",
            ImportType::OneMoney => "1money",
        };
        println!(
            "  {:<16} {:<28} {}",
            name,
            import_type.list_name(),
            import_type.app_id()
        );
    }
}

/// Handle the import command
pub fn handle_import_command(storage: &Storage, file: &str, format: &str) -> WalletResult<()> {
    let import_type = ImportType::parse(format).ok_or_else(|| {
        WalletError::Validation(format!(
            "Unknown import format '{}'. Run 'wallet import --formats' to list them",
            format
        ))
    })?;

    let path = Path::new(file);
    if !path.exists() {
        return Err(WalletError::Import(format!("File not found: {}", file)));
    }

    let result = ImportService::new(storage).import_file(path, import_type)?;

    println!("Import from {} complete", import_type.app_name());
    println!("  Imported:    {}", result.imported);
    println!("  Skipped:     {}", result.duplicates_skipped);
    if !result.accounts_created.is_empty() {
        println!("  New accounts:   {}", result.accounts_created.join(", "));
    }
    if !result.categories_created.is_empty() {
        println!("  New categories: {}", result.categories_created.join(", "));
    }
    if !result.errors.is_empty() {
        println!("  Errors:      {}", result.errors.len());
        for message in &result.errors {
            println!("    {}", message);
        }
    }

    Ok(())
}
