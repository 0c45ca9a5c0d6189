// vendbot/core/src/model/product.rs

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single-use credential pre-loaded for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
  pub id: u64,
  pub product_id: String,
  pub detail: String,
  #[serde(default)]
  pub is_sold: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub id: String,
  pub name: String,
  /// Smallest currency unit.
  pub price: u64,
  #[serde(default)]
  pub description: String,
  /// Only populated by the file backend; the row backend keeps stock in its own table.
  #[serde(default)]
  pub stock_items: Vec<StockItem>,
}

impl Product {
  pub fn available(&self) -> usize {
    self.stock_items.iter().filter(|s| !s.is_sold).count()
  }
}

/// Input of `CatalogStore::add_product`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
  pub id: String,
  pub name: String,
  pub price: u64,
  pub description: String,
}

/// The only product fields an admin may edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductField {
  Name,
  Price,
  Description,
}

impl FromStr for ProductField {
  type Err = StoreError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "name" => Ok(ProductField::Name),
      "price" => Ok(ProductField::Price),
      "description" => Ok(ProductField::Description),
      other => Err(StoreError::InvalidField(other.to_string())),
    }
  }
}

impl fmt::Display for ProductField {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      ProductField::Name => "name",
      ProductField::Price => "price",
      ProductField::Description => "description",
    })
  }
}

/// Parses a price as a positive integer.
pub fn parse_price(raw: &str) -> Result<u64, StoreError> {
  match raw.trim().parse::<u64>() {
    Ok(price) if price > 0 => Ok(price),
    _ => Err(StoreError::InvalidPrice(raw.trim().to_string())),
  }
}

/// One row of the `/infostock` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockLine {
  pub product_id: String,
  pub name: String,
  pub available: usize,
  pub sold: usize,
}
