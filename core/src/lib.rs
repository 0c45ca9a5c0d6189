// vendbot/core/src/lib.rs

//! vendbot-core: the storage and workflow layer of the vendbot chat storefront.
//!
//!  - `model`: products, stock items, orders and the results of the order transitions.
//!  - `store`: the `CatalogStore` / `OrderLedger` contracts with a JSON-file and a Postgres backend.
//!  - `flow`: a small async step-pipeline engine and a type-keyed registry used by the bot's workflows.
//!
//! The one correctness property that lives here: a stock item is handed to at
//! most one order. `CatalogStore::reserve_one` claims an item atomically, and
//! `OrderLedger::settle_order` runs lookup, reservation and the guarded
//! PENDING -> PAID transition as a single unit.

pub mod error;
pub mod flow;
pub mod model;
pub mod store;

pub use crate::error::{FlowError, StoreError, StoreResult};
pub use crate::flow::{ContextData, FlowOutcome, FlowRegistry, Pipeline, StepControl};
pub use crate::model::{
  generate_external_id, parse_price, MarkPaid, NewOrder, NewProduct, Order, OrderStatus, Product, ProductField,
  Settlement, StockItem, StockLine,
};
pub use crate::store::{CatalogStore, JsonFileStore, OrderLedger, PgStore, Store};
