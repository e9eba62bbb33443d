//! Product domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::ProductRequest;
use crate::error::DomainError;

/// Unique identifier for a Product.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct ProductId(u32);

impl ProductId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    /// The identifier following this one.
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ProductId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// A product sold by the catalog.
///
/// `price` is in minor units of the catalog's base currency. Converted prices
/// are derived on read and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub sku: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Creates a new product after validating the request.
    ///
    /// # Validation
    /// - Name cannot be empty
    /// - Price must be positive
    /// - SKU must look like `abc-def-ghi` (three lowercase groups)
    pub fn new(id: ProductId, req: ProductRequest) -> Result<Self, DomainError> {
        validate(&req)?;
        let now = Utc::now();
        Ok(Self {
            id,
            name: req.name,
            description: req.description,
            price: req.price,
            sku: req.sku,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replaces the editable fields, keeping id and creation time.
    pub fn apply(&mut self, req: ProductRequest) -> Result<(), DomainError> {
        validate(&req)?;
        self.name = req.name;
        self.description = req.description;
        self.price = req.price;
        self.sku = req.sku;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn validate(req: &ProductRequest) -> Result<(), DomainError> {
    if req.name.trim().is_empty() {
        return Err(DomainError::ValidationError(
            "Product name cannot be empty".into(),
        ));
    }
    if req.price <= 0 {
        return Err(DomainError::ValidationError(
            "Product price must be positive".into(),
        ));
    }
    if !is_valid_sku(&req.sku) {
        return Err(DomainError::ValidationError(format!(
            "Invalid SKU '{}': expected format abc-def-ghi",
            req.sku
        )));
    }
    Ok(())
}

/// SKUs are three non-empty groups of lowercase ASCII letters joined by `-`.
pub fn is_valid_sku(sku: &str) -> bool {
    let groups: Vec<&str> = sku.split('-').collect();
    groups.len() == 3
        && groups
            .iter()
            .all(|g| !g.is_empty() && g.chars().all(|c| c.is_ascii_lowercase()))
}
