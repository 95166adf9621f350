//! Seed the catalog from a YAML file.
//!
//! The file holds a `products` list; every entry is validated like an API
//! create.
//!
//! ```yaml
//! products:
//!   - title: Field Notes
//!     description: Pocket notebook
//!     price: 9.95
//!     category: Stationery
//!     stock: 40
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use emporium_core::NewProduct;
use emporium_server::db::{self, Stores};
use emporium_server::services::{CatalogFeed, CatalogService};

/// Seed file layout.
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub products: Vec<NewProduct>,
}

/// Insert every product in `file_path`.
///
/// Invalid entries are logged and skipped.
///
/// # Errors
///
/// Returns an error if the environment is incomplete, the file cannot be read
/// or parsed, or the database is unreachable.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url()?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading products from file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    info!(products = seed.products.len(), "Parsed seed file");

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let stores = Stores::postgres(&pool);
    let feed = CatalogFeed::new();
    let catalog = CatalogService::new(stores.products.as_ref(), &feed);

    let mut inserted = 0usize;
    let mut failed = 0usize;
    for input in seed.products {
        let title = input.title.clone();
        match catalog.create(input).await {
            Ok(product) => {
                info!(id = %product.id, title = %product.title, "Inserted product");
                inserted += 1;
            }
            Err(e) => {
                error!(title = %title, error = %e, "Skipped product");
                failed += 1;
            }
        }
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    info!("  Products skipped: {failed}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_file_parses() {
        let yaml = r"
products:
  - title: Field Notes
    description: Pocket notebook
    price: 9.95
    category: Stationery
    stock: 40
  - title: Fountain Pen
    price: 35.0
    category: Stationery
";
        let seed: SeedFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(seed.products.len(), 2);
        let pen = seed.products.last().unwrap();
        assert_eq!(pen.stock, 0);
        assert!(pen.status);
    }
}
