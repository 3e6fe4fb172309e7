//! Export module for wallet-cli
//!
//! - CSV: transactions in the Ivy Wallet layout, readable by the importer
//! - JSON: machine-readable full export
//! - YAML: human-readable full export

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::{export_transactions_csv, IVY_CSV_HEADERS};
pub use self::json::{export_full_json, read_full_json, FullExport, EXPORT_SCHEMA_VERSION};
pub use self::yaml::{export_full_yaml, read_full_yaml};
