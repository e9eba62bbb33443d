//! Catalog Application Service
//!
//! Composes the product repository with the rate cache. Stored products stay
//! in the base currency; conversions produce fresh views and never write back.

use catalog_currency::convert_minor;
use catalog_types::{
    AppError, CurrencyCode, Product, ProductId, ProductRepository, ProductRequest, ProductView,
    RateError, RatesSnapshot, StreamState,
};

use crate::rates::RateCache;

/// Application service for catalog operations.
///
/// Generic over `R: ProductRepository`; the rate cache is a shared handle.
pub struct ProductCatalog<R: ProductRepository> {
    repo: R,
    rates: RateCache,
}

impl<R: ProductRepository> ProductCatalog<R> {
    pub fn new(repo: R, rates: RateCache) -> Self {
        Self { repo, rates }
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn rates(&self) -> &RateCache {
        &self.rates
    }

    pub fn base_currency(&self) -> CurrencyCode {
        self.rates.base()
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Priced reads
    // ─────────────────────────────────────────────────────────────────────────────

    /// Lists every product priced in `currency`.
    ///
    /// `None`, an empty string or the base currency return base prices without
    /// consulting the rate cache. Rate errors are returned as they are.
    pub async fn get_converted_products(
        &self,
        currency: Option<&str>,
    ) -> Result<Vec<ProductView>, AppError> {
        let target = self.target_currency(currency)?;
        let products = self.repo.list_products().await?;

        let Some(target) = target else {
            let base = self.base_currency();
            return Ok(products
                .iter()
                .map(|p| ProductView::from_product(p, base))
                .collect());
        };

        let rate = self.rates.get_rate(target).await?;
        Ok(products
            .iter()
            .map(|p| self.convert(p, target, rate))
            .collect())
    }

    /// Gets one product priced in `currency`.
    ///
    /// An unknown id fails with `NotFound` before any rate is looked up.
    pub async fn get_converted_product(
        &self,
        id: ProductId,
        currency: Option<&str>,
    ) -> Result<ProductView, AppError> {
        let target = self.target_currency(currency)?;
        let product = self.get_product(id).await?;

        match target {
            None => Ok(ProductView::from_product(&product, self.base_currency())),
            Some(target) => {
                let rate = self.rates.get_rate(target).await?;
                Ok(self.convert(&product, target, rate))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Base-currency writes
    // ─────────────────────────────────────────────────────────────────────────────

    /// Gets a stored product by ID.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, AppError> {
        self.repo
            .get_product(id)
            .await
            .map_err(Into::into)
            .and_then(|opt| opt.ok_or_else(|| AppError::NotFound("Product not found".into())))
    }

    pub async fn add_product(&self, req: ProductRequest) -> Result<Product, AppError> {
        let product = self.repo.add_product(req).await?;
        tracing::info!(id = %product.id, sku = %product.sku, "Product added");
        Ok(product)
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        req: ProductRequest,
    ) -> Result<Product, AppError> {
        let product = self.repo.update_product(id, req).await?;
        tracing::info!(%id, "Product updated");
        Ok(product)
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), AppError> {
        self.repo.delete_product(id).await?;
        tracing::info!(%id, "Product deleted");
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Rates
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn rates_snapshot(&self, stream_state: StreamState) -> RatesSnapshot {
        self.rates.snapshot(stream_state)
    }

    /// Resolves the requested currency. `None` means "use base prices".
    fn target_currency(&self, currency: Option<&str>) -> Result<Option<CurrencyCode>, RateError> {
        let code = match currency.map(str::trim) {
            None | Some("") => return Ok(None),
            Some(code) => code,
        };

        let target: CurrencyCode = code
            .parse()
            .map_err(|_| RateError::InvalidCurrency(code.to_string()))?;

        if target == self.base_currency() {
            Ok(None)
        } else {
            Ok(Some(target))
        }
    }

    fn convert(&self, product: &Product, target: CurrencyCode, rate: f64) -> ProductView {
        let price = convert_minor(product.price, rate, self.base_currency(), target);
        ProductView::with_price(product, target, price)
    }
}
