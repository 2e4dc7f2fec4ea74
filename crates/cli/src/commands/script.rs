//! YAML edit scripts.
//!
//! A script is a list of draft operations applied in order to a freshly
//! seeded edit session:
//!
//! ```yaml
//! - op: set_name
//!   name: Gorra trucker
//! - op: remove_image
//!   id: "17"
//! - op: add_image
//!   path: ./fotos/frente.jpg
//! - op: patch_variant
//!   id: "8"
//!   price: 1200
//! - op: add_variant
//!   option_key: Color
//!   option_value: Rojo
//!   price: "500"
//!   stock: 3
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chatshop_admin::catalog::StagedBinary;
use chatshop_admin::draft::{ProductDraft, VariantPatch};
use chatshop_core::{CategoryId, CategoryIndex, ImageId, VariantId};
use serde::Deserialize;

use crate::error::CliError;

/// A price or stock as written in the script: `1200`, `"1200"` or `12.5`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_yaml::Number),
    Text(String),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// One draft operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOp {
    SetName {
        name: String,
    },
    SetDescription {
        description: String,
    },
    /// A missing or blank price clears it.
    SetPrice {
        #[serde(default)]
        price: Option<Scalar>,
    },
    SetStock {
        #[serde(default)]
        stock: Option<Scalar>,
    },
    SetCategory {
        #[serde(default)]
        id: Option<String>,
    },
    RemoveImage {
        id: String,
    },
    AddImage {
        path: PathBuf,
    },
    PatchVariant {
        id: String,
        #[serde(default)]
        option_key: Option<String>,
        #[serde(default)]
        option_value: Option<String>,
        #[serde(default)]
        price: Option<Scalar>,
        #[serde(default)]
        stock: Option<Scalar>,
    },
    DeleteVariant {
        id: String,
    },
    RemoveVariantImage {
        id: String,
    },
    SetVariantImage {
        id: String,
        path: PathBuf,
    },
    AddVariant {
        #[serde(default)]
        option_key: String,
        #[serde(default)]
        option_value: String,
        #[serde(default)]
        price: Option<Scalar>,
        #[serde(default)]
        stock: Option<Scalar>,
        #[serde(default)]
        image: Option<PathBuf>,
    },
}

/// Parse a script from YAML text.
///
/// # Errors
///
/// Returns [`CliError::Script`] if the YAML is not a list of operations.
pub fn parse(yaml: &str) -> Result<Vec<EditOp>, CliError> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Read and parse a script file.
///
/// # Errors
///
/// Returns [`CliError::Io`] if the file cannot be read, or
/// [`CliError::Script`] if it does not parse.
pub async fn load(path: &Path) -> Result<Vec<EditOp>, CliError> {
    let yaml = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    parse(&yaml)
}

async fn read_image(path: &Path) -> Result<StagedBinary, CliError> {
    StagedBinary::from_path(path)
        .await
        .map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        })
}

fn text(value: Option<&Scalar>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

fn variant_patch(
    option_key: Option<&str>,
    option_value: Option<&str>,
    price: Option<&Scalar>,
    stock: Option<&Scalar>,
) -> Result<VariantPatch, CliError> {
    let mut patch = VariantPatch::new()
        .price_text(&text(price))?
        .stock_text(&text(stock))?;
    if let Some(key) = option_key {
        patch = patch.option_key(key);
    }
    if let Some(value) = option_value {
        patch = patch.option_value(value);
    }
    Ok(patch)
}

/// Apply `ops` to `draft`, stopping at the first operation that fails.
///
/// # Errors
///
/// Returns an error naming the failing step if an operation targets an
/// unknown id, exceeds the image cap, carries invalid input, or names an
/// unreadable file.
pub async fn apply(
    ops: &[EditOp],
    draft: &mut ProductDraft,
    categories: &CategoryIndex,
) -> Result<(), CliError> {
    for (index, op) in ops.iter().enumerate() {
        let step = index + 1;
        let invalid = |message: String| CliError::InvalidStep { step, message };

        match op {
            EditOp::SetName { name } => draft.set_name(name.as_str()),
            EditOp::SetDescription { description } => draft.set_description(description.as_str()),
            EditOp::SetPrice { price } => draft.set_price_text(&text(price.as_ref()))?,
            EditOp::SetStock { stock } => draft.set_stock_text(&text(stock.as_ref()))?,
            EditOp::SetCategory { id } => {
                draft.set_category(id.as_deref().map(CategoryId::new), Some(categories))?;
            }
            EditOp::RemoveImage { id } => {
                if !draft.remove_image(&ImageId::new(id.as_str())) {
                    return Err(invalid(format!("no general image {id}")));
                }
            }
            EditOp::AddImage { path } => {
                let binary = read_image(path).await?;
                if draft.stage_image(binary).is_none() {
                    return Err(invalid(format!(
                        "image limit reached, {} not added",
                        path.display()
                    )));
                }
            }
            EditOp::PatchVariant {
                id,
                option_key,
                option_value,
                price,
                stock,
            } => {
                let patch = variant_patch(
                    option_key.as_deref(),
                    option_value.as_deref(),
                    price.as_ref(),
                    stock.as_ref(),
                )?;
                if !draft
                    .variants_mut()
                    .patch_existing(&VariantId::new(id.as_str()), &patch)
                {
                    return Err(invalid(format!("no variant {id}")));
                }
            }
            EditOp::DeleteVariant { id } => {
                if !draft
                    .variants_mut()
                    .mark_existing_deleted(&VariantId::new(id.as_str()))
                {
                    return Err(invalid(format!("no variant {id}")));
                }
            }
            EditOp::RemoveVariantImage { id } => {
                if !draft
                    .variants_mut()
                    .remove_existing_image(&VariantId::new(id.as_str()))
                {
                    return Err(invalid(format!("no variant {id}")));
                }
            }
            EditOp::SetVariantImage { id, path } => {
                let binary = read_image(path).await?;
                if !draft.stage_variant_image(&VariantId::new(id.as_str()), binary) {
                    return Err(invalid(format!("no variant {id}")));
                }
            }
            EditOp::AddVariant {
                option_key,
                option_value,
                price,
                stock,
                image,
            } => {
                let patch = variant_patch(
                    Some(option_key.as_str()),
                    Some(option_value.as_str()),
                    price.as_ref(),
                    stock.as_ref(),
                )?;
                let local_id = draft.variants_mut().add_new();
                draft.variants_mut().patch_new(local_id, &patch);
                if let Some(path) = image {
                    let binary = read_image(path).await?;
                    draft.stage_new_variant_image(local_id, binary);
                }
            }
        }
    }
    Ok(())
}
