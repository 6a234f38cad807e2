use crate::models::Product;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading the product catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate product id: {0}")]
    DuplicateId(String),

    #[error("Product at position {0} has an empty id")]
    EmptyId(usize),

    #[error("Invalid price for product {id}: {price}")]
    InvalidPrice { id: String, price: f64 },
}

/// Read-only, in-memory product catalog
///
/// Validated once at load and never mutated afterwards, so a single
/// instance can be shared by every request.
#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    products: Vec<Product>,
}

impl ProductCatalog {
    /// Build a catalog from already-parsed records, validating the schema
    pub fn from_products(products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(products.len());

        for (index, product) in products.iter().enumerate() {
            if product.id.trim().is_empty() {
                return Err(CatalogError::EmptyId(index));
            }
            if !product.price.is_finite() || product.price < 0.0 {
                return Err(CatalogError::InvalidPrice {
                    id: product.id.clone(),
                    price: product.price,
                });
            }
            if !seen.insert(product.id.as_str()) {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }

        Ok(Self { products })
    }

    /// Parse a JSON array of product records
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let products: Vec<Product> = serde_json::from_str(json)?;
        Self::from_products(products)
    }

    /// Load a catalog file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let catalog = Self::from_json(&contents)?;
        tracing::info!(
            "Loaded {} products from {}",
            catalog.len(),
            path.as_ref().display()
        );
        Ok(catalog)
    }

    /// All products in catalog order
    pub fn list_products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn by_category(&self, category: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| {
                p.category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(category))
            })
            .collect()
    }

    pub fn in_price_range(&self, min_price: Option<f64>, max_price: Option<f64>) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.in_price_range(min_price, max_price))
            .collect()
    }

    pub fn by_size(&self, size: &str) -> Vec<&Product> {
        self.products.iter().filter(|p| p.has_size(size)).collect()
    }
}
