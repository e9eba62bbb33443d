//! Domain models for the catalog service.

pub mod product;
pub mod rate;

pub use product::{Product, ProductId};
pub use rate::{RateEntry, StreamState};
