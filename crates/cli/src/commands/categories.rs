//! Category listing.

use chatshop_admin::AdminConfig;
use chatshop_admin::catalog::{CatalogApi, RestCatalogClient};
use chatshop_core::CategoryIndex;

use crate::error::CliError;

/// Print main categories with their subcategories indented below.
///
/// # Errors
///
/// Returns error if the backend cannot be reached.
#[allow(clippy::print_stdout)]
pub async fn list(config: &AdminConfig) -> Result<(), CliError> {
    let api = RestCatalogClient::new(config)?;
    let index = CategoryIndex::new(api.list_categories().await?);
    for line in tree_lines(&index) {
        println!("{line}");
    }
    Ok(())
}

fn tree_lines(index: &CategoryIndex) -> Vec<String> {
    let mut lines = Vec::with_capacity(index.len());
    for main in index.main_categories() {
        lines.push(format!("{} [{}]", main.name, main.id));
        lines.extend(
            index
                .subcategories(&main.id)
                .map(|sub| format!("  - {} [{}]", sub.name, sub.id)),
        );
    }
    lines
}
