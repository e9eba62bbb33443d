//! InMemoryRepo tests.

use catalog_types::{DomainError, ProductId, ProductRepository, ProductRequest, RepoError};

use crate::InMemoryRepo;

fn request(name: &str, price: i64) -> ProductRequest {
    ProductRequest {
        name: name.to_string(),
        description: format!("{} description", name),
        price,
        sku: "tea-grn-hot".to_string(),
    }
}

#[tokio::test]
async fn test_seeded_repo_has_default_products() {
    let repo = InMemoryRepo::seeded();
    let products = repo.list_products().await.unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].name, "Latte");
    assert_eq!(products[0].price, 245);
    assert_eq!(products[1].name, "Espresso");
    assert_eq!(products[1].price, 199);
}

#[tokio::test]
async fn test_add_assigns_next_id() {
    let repo = InMemoryRepo::seeded();
    let product = repo.add_product(request("Tea", 150)).await.unwrap();

    assert_eq!(product.id, ProductId::new(3));
    assert_eq!(repo.list_products().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_add_to_empty_repo_starts_at_one() {
    let repo = InMemoryRepo::new();
    let product = repo.add_product(request("Tea", 150)).await.unwrap();
    assert_eq!(product.id, ProductId::new(1));
}

#[tokio::test]
async fn test_add_invalid_product_is_rejected() {
    let repo = InMemoryRepo::new();
    let result = repo.add_product(request("", 150)).await;

    assert!(matches!(
        result,
        Err(RepoError::Domain(DomainError::ValidationError(_)))
    ));
    assert!(repo.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_product() {
    let repo = InMemoryRepo::seeded();

    let found = repo.get_product(ProductId::new(2)).await.unwrap();
    assert_eq!(found.map(|p| p.name), Some("Espresso".to_string()));

    let missing = repo.get_product(ProductId::new(99)).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_update_product() {
    let repo = InMemoryRepo::seeded();
    let updated = repo
        .update_product(ProductId::new(1), request("Flat White", 280))
        .await
        .unwrap();

    assert_eq!(updated.id, ProductId::new(1));
    assert_eq!(updated.price, 280);

    let stored = repo.get_product(ProductId::new(1)).await.unwrap().unwrap();
    assert_eq!(stored.name, "Flat White");
}

#[tokio::test]
async fn test_update_missing_product() {
    let repo = InMemoryRepo::seeded();
    let result = repo
        .update_product(ProductId::new(42), request("Ghost", 100))
        .await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_delete_removes_only_that_product() {
    let repo = InMemoryRepo::seeded();
    repo.add_product(request("Tea", 150)).await.unwrap();

    repo.delete_product(ProductId::new(2)).await.unwrap();

    let ids: Vec<u32> = repo
        .list_products()
        .await
        .unwrap()
        .iter()
        .map(|p| p.id.value())
        .collect();
    assert_eq!(ids, vec![1, 3]);
}

#[tokio::test]
async fn test_delete_missing_product() {
    let repo = InMemoryRepo::seeded();
    let result = repo.delete_product(ProductId::new(42)).await;
    assert!(matches!(result, Err(RepoError::NotFound)));
}
