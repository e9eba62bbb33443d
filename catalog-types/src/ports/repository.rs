//! Product repository port.

use crate::domain::{Product, ProductId};
use crate::dto::ProductRequest;
use crate::error::RepoError;

/// Storage for the base-currency product list.
///
/// Stored products are the source of truth and are never modified by
/// currency conversion.
#[async_trait::async_trait]
pub trait ProductRepository: Send + Sync + 'static {
    /// Lists all products in id order.
    async fn list_products(&self) -> Result<Vec<Product>, RepoError>;

    /// Gets a product by ID.
    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepoError>;

    /// Adds a product, assigning the next free ID.
    async fn add_product(&self, req: ProductRequest) -> Result<Product, RepoError>;

    /// Replaces an existing product. Returns `RepoError::NotFound` if absent.
    async fn update_product(
        &self,
        id: ProductId,
        req: ProductRequest,
    ) -> Result<Product, RepoError>;

    /// Removes a product. Returns `RepoError::NotFound` if absent.
    async fn delete_product(&self, id: ProductId) -> Result<(), RepoError>;
}
