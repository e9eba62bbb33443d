//! In-memory product repository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use catalog_types::{Product, ProductId, ProductRepository, ProductRequest, RepoError};

/// Product list guarded by an async reader-writer lock.
pub struct InMemoryRepo {
    products: RwLock<Vec<Product>>,
}

impl InMemoryRepo {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self {
            products: RwLock::new(Vec::new()),
        }
    }

    /// Creates a repository holding the default coffee menu.
    pub fn seeded() -> Self {
        let seed = [
            ("Latte", "Frothy milky coffee", 245, "cof-lat-mlk"),
            (
                "Espresso",
                "Short and strong coffee without milk",
                199,
                "cof-esp-sht",
            ),
        ];

        let products = seed
            .into_iter()
            .zip(1u32..)
            .filter_map(|((name, description, price, sku), id)| {
                Product::new(
                    ProductId::new(id),
                    ProductRequest {
                        name: name.into(),
                        description: description.into(),
                        price,
                        sku: sku.into(),
                    },
                )
                .ok()
            })
            .collect();

        Self {
            products: RwLock::new(products),
        }
    }
}

impl Default for InMemoryRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductRepository for InMemoryRepo {
    async fn list_products(&self) -> Result<Vec<Product>, RepoError> {
        Ok(self.products.read().await.clone())
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepoError> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn add_product(&self, req: ProductRequest) -> Result<Product, RepoError> {
        let mut products = self.products.write().await;
        let id = products
            .iter()
            .map(|p| p.id)
            .max()
            .map(|last| last.next())
            .unwrap_or_else(|| ProductId::new(1));

        let product = Product::new(id, req)?;
        products.push(product.clone());
        tracing::debug!(product_id = %id, "Product added");
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        req: ProductRequest,
    ) -> Result<Product, RepoError> {
        let mut products = self.products.write().await;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;

        product.apply(req)?;
        Ok(product.clone())
    }

    async fn delete_product(&self, id: ProductId) -> Result<(), RepoError> {
        let mut products = self.products.write().await;
        let index = products
            .iter()
            .position(|p| p.id == id)
            .ok_or(RepoError::NotFound)?;

        products.remove(index);
        tracing::debug!(product_id = %id, "Product deleted");
        Ok(())
    }
}
