// vendbot/core/src/store/mod.rs

//! Storage contracts for the catalog and the order ledger, plus their two
//! backends: JSON documents on disk and Postgres rows.
//!
//! Every mutation that hands out stock goes through `reserve_one` or
//! `settle_order`, which are atomic from the store's point of view. No caller
//! should read a product, pick an item and write it back on its own.

pub mod file;
pub mod postgres;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::model::{MarkPaid, NewOrder, NewProduct, Order, Product, ProductField, Settlement, StockItem, StockLine};

pub use file::JsonFileStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CatalogStore: Send + Sync {
  /// All products in storage order.
  async fn list_products(&self) -> StoreResult<Vec<Product>>;

  async fn find_product(&self, id: &str) -> StoreResult<Option<Product>>;

  /// Number of unsold stock items; 0 for an unknown product.
  async fn available_stock(&self, product_id: &str) -> StoreResult<usize>;

  /// Fails with `DuplicateProduct` if the id is taken.
  async fn add_product(&self, product: NewProduct) -> StoreResult<Product>;

  async fn remove_product(&self, id: &str) -> StoreResult<()>;

  async fn edit_product(&self, id: &str, field: ProductField, value: &str) -> StoreResult<Product>;

  /// Fails with `UnknownProduct` if the product is absent.
  async fn add_stock_item(&self, product_id: &str, detail: &str) -> StoreResult<StockItem>;

  /// Atomically claims one unsold item. `None` means sold out.
  async fn reserve_one(&self, product_id: &str) -> StoreResult<Option<StockItem>>;

  async fn stock_report(&self) -> StoreResult<Vec<StockLine>>;
}

#[async_trait]
pub trait OrderLedger: Send + Sync {
  /// Records a PENDING order.
  async fn create_order(&self, order: NewOrder) -> StoreResult<Order>;

  async fn find_order(&self, external_id: &str) -> StoreResult<Option<Order>>;

  /// Guarded PENDING -> PAID transition. An already paid order is left untouched.
  async fn mark_paid(&self, external_id: &str, stock_item_id: Option<u64>) -> StoreResult<MarkPaid>;

  /// Looks up the order, reserves one item of its product and marks it paid,
  /// all as one atomic unit. A second call for the same order reports
  /// `AlreadyPaid` and consumes nothing.
  async fn settle_order(&self, external_id: &str) -> StoreResult<Settlement>;
}

/// Everything the bot needs from its backing store.
pub trait Store: CatalogStore + OrderLedger {}

impl<T: CatalogStore + OrderLedger> Store for T {}
