// vendbot/core/src/model/mod.rs

//! Records held by the catalog store and the order ledger.

pub mod order;
pub mod product;

pub use order::{generate_external_id, MarkPaid, NewOrder, Order, OrderStatus, Settlement};
pub use product::{parse_price, NewProduct, Product, ProductField, StockItem, StockLine};
