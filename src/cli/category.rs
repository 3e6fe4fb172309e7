//! Category CLI commands

use clap::Subcommand;

use crate::cli::{parse_color, resolve_range};
use crate::display::category::{format_category_details, format_category_list};
use crate::error::WalletResult;
use crate::services::category::CategoryEdit;
use crate::services::CategoryService;
use crate::storage::Storage;

/// Category subcommands
#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Create a new category
    Create {
        /// Category name
        name: String,
        /// Display color (#RRGGBB)
        #[arg(long)]
        color: Option<String>,
        /// Icon name
        #[arg(long)]
        icon: Option<String>,
    },
    /// List categories with income and expenses for a period
    List {
        /// Period (YYYY-MM, "all", or FROM..TO); defaults to this month
        #[arg(short, long)]
        period: Option<String>,
    },
    /// Show category details
    Show {
        /// Category name or ID
        category: String,
    },
    /// Edit a category
    Edit {
        /// Category name or ID
        category: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// Set the display order (first to last)
    Reorder {
        #[arg(required = true)]
        categories: Vec<String>,
    },
    /// Delete a category; its transactions become uncategorized
    Delete {
        /// Category name or ID
        category: String,
    },
}

/// Handle a category command
pub fn handle_category_command(storage: &Storage, cmd: CategoryCommands) -> WalletResult<()> {
    let service = CategoryService::new(storage);

    match cmd {
        CategoryCommands::Create { name, color, icon } => {
            let color = color.as_deref().map(parse_color).transpose()?;
            let category = service.create(&name, color, icon)?;
            println!("Created category: {}", category.name);
            println!("  ID: {}", category.id);
        }

        CategoryCommands::List { period } => {
            let range = resolve_range(storage, period.as_deref())?;
            let categories = service.list_with_data(range)?;
            print!(
                "{}",
                format_category_list(&categories, &storage.settings.base_currency()?)
            );
        }

        CategoryCommands::Show { category } => {
            let found = service.require(&category)?;
            print!("{}", format_category_details(&found));
        }

        CategoryCommands::Edit {
            category,
            name,
            color,
            icon,
        } => {
            let found = service.require(&category)?;
            let edit = CategoryEdit {
                name,
                color: color.as_deref().map(parse_color).transpose()?,
                icon,
            };
            let updated = service.edit(found.id, edit)?;
            println!("Updated category: {}", updated.name);
        }

        CategoryCommands::Reorder { categories } => {
            let ids = categories
                .iter()
                .map(|c| service.require(c).map(|found| found.id))
                .collect::<WalletResult<Vec<_>>>()?;
            service.reorder(&ids)?;
            println!("Reordered {} categories", ids.len());
        }

        CategoryCommands::Delete { category } => {
            let found = service.require(&category)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted category: {}", deleted.name);
        }
    }

    Ok(())
}
