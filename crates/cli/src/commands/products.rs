//! Product listing and scripted edits.

use std::path::Path;

use chatshop_admin::AdminConfig;
use chatshop_admin::catalog::{CatalogApi, RestCatalogClient};
use chatshop_admin::reconcile::{CommitPlan, ReconciliationEngine, VariantAction};
use chatshop_core::{
    CategoryIndex, InventorySummary, Product, ProductId, StockLevel, filter_products, total_stock,
};

use super::script::{self, EditOp};
use crate::error::CliError;

/// List products with their stock, optionally filtered.
///
/// # Errors
///
/// Returns error if the backend cannot be reached.
#[allow(clippy::print_stdout)]
pub async fn list(config: &AdminConfig, query: Option<&str>) -> Result<(), CliError> {
    let api = RestCatalogClient::new(config)?;
    let (products, categories) = tokio::try_join!(api.list_products(), api.list_categories())?;
    let index = CategoryIndex::new(categories);

    let summary = InventorySummary::from_products(&products);
    println!(
        "{} products, {} in stock, {} out of stock",
        summary.total, summary.in_stock, summary.out_of_stock
    );
    for product in filter_products(&products, query.unwrap_or_default()) {
        println!("{}", product_line(product, &index));
    }
    Ok(())
}

/// Apply an edit script to one product and commit it.
///
/// # Errors
///
/// Returns error if the script is invalid, the product does not exist, or
/// any remote call fails.
pub async fn edit(
    config: &AdminConfig,
    id: &ProductId,
    script_path: &Path,
    dry_run: bool,
) -> Result<(), CliError> {
    let ops = script::load(script_path).await?;
    let engine = ReconciliationEngine::with_config(RestCatalogClient::new(config)?, config);
    run_edit(&engine, id, &ops, dry_run).await?;
    Ok(())
}

/// Seed a session for `id`, apply `ops` and commit unless `dry_run`.
///
/// Returns the plan that was (or would have been) executed.
#[allow(clippy::print_stdout)]
pub async fn run_edit<A: CatalogApi>(
    engine: &ReconciliationEngine<A>,
    id: &ProductId,
    ops: &[EditOp],
    dry_run: bool,
) -> Result<CommitPlan, CliError> {
    let product = find_product(engine.api(), id).await?;
    let categories = CategoryIndex::new(engine.api().list_categories().await?);

    let mut session = engine.begin_edit(&product);
    if let Err(e) = script::apply(ops, session.draft_mut(), &categories).await {
        engine.discard(session);
        return Err(e);
    }

    let plan = engine.plan(&session.draft().snapshot());
    if plan.is_empty() {
        println!("Nothing to save");
    }
    for line in describe_plan(&plan) {
        println!("  {line}");
    }

    if dry_run {
        engine.discard(session);
        return Ok(plan);
    }

    let outcome = engine.commit(session).await;
    if let Some(failure) = outcome.failure() {
        let event_id = sentry::capture_error(failure);
        tracing::error!(
            error = %failure,
            product_id = %id,
            sentry_event_id = %event_id,
            "Commit partially failed"
        );
    }
    let committed = outcome.into_result();

    // Nothing is cached locally; show what the backend now holds either way
    match (find_product(engine.api(), id).await, &committed) {
        (Ok(current), Ok(())) => println!("Saved. {}", product_line(&current, &categories)),
        (Ok(current), Err(_)) => {
            println!("Not all changes were saved. Current state:");
            println!("{}", product_line(&current, &categories));
        }
        (Err(e), Ok(())) => return Err(e),
        (Err(e), Err(_)) => {
            tracing::warn!(error = %e, product_id = %id, "Re-fetch after failed commit failed");
        }
    }
    committed?;
    Ok(plan)
}

async fn find_product<A: CatalogApi>(api: &A, id: &ProductId) -> Result<Product, CliError> {
    api.list_products()
        .await?
        .into_iter()
        .find(|p| &p.id == id)
        .ok_or_else(|| CliError::ProductNotFound(id.clone()))
}

/// One row of the product list.
fn product_line(product: &Product, categories: &CategoryIndex) -> String {
    let category = product
        .category
        .as_ref()
        .map(|c| categories.path(&c.id).unwrap_or_else(|| c.name.clone()))
        .unwrap_or_else(|| "-".to_string());
    let stock = total_stock(product);
    format!(
        "[{}] {} | {} | stock {stock} ({}) | {category}",
        product.id,
        product.name,
        price_label(product),
        StockLevel::from_units(stock),
    )
}

/// Product price, or the range of variant prices.
fn price_label(product: &Product) -> String {
    let prices = product.product_variants.iter().filter_map(|v| v.price);
    match (prices.clone().min(), prices.max()) {
        (Some(low), Some(high)) if low == high => low.display_cop(),
        (Some(low), Some(high)) => format!("{}-{}", low.display_cop(), high.display_cop()),
        _ => product
            .price
            .map_or_else(|| "-".to_string(), |p| p.display_cop()),
    }
}

/// Human-readable list of the calls in `plan`, in execution order.
fn describe_plan(plan: &CommitPlan) -> Vec<String> {
    let mut lines = Vec::with_capacity(plan.call_count());

    if let Some(update) = &plan.product_update {
        let fields: Vec<&str> = [
            ("name", update.name.is_some()),
            ("description", update.description.is_some()),
            ("price", update.price.is_some()),
            ("stock", update.stock.is_some()),
            ("category", update.category_id.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, set)| set.then_some(name))
        .collect();
        lines.push(format!("update product {}: {}", plan.product_id, fields.join(", ")));
    }
    lines.extend(plan.image_deletions.iter().map(|id| format!("delete image {id}")));
    lines.extend(
        plan.image_uploads
            .iter()
            .map(|img| format!("upload image {}", img.file_name())),
    );
    for change in &plan.variant_changes {
        let id = &change.variant_id;
        match &change.action {
            VariantAction::Delete => lines.push(format!("delete variant {id}")),
            VariantAction::Modify {
                update,
                delete_image,
                set_image,
            } => {
                if update.is_some() {
                    lines.push(format!("update variant {id}"));
                }
                if let Some(image_id) = delete_image {
                    lines.push(format!("delete image {image_id} of variant {id}"));
                }
                if let Some(image) = set_image {
                    lines.push(format!("set image of variant {id} to {}", image.file_name()));
                }
            }
        }
    }
    lines.extend(plan.variant_creations.iter().map(|v| {
        format!(
            "create variant {}={} (price {}, stock {})",
            v.option_key,
            v.option_value,
            v.price.display_cop(),
            v.stock
        )
    }));
    lines
}
