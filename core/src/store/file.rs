// vendbot/core/src/store/file.rs

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::{CatalogStore, OrderLedger};
use crate::error::{StoreError, StoreResult};
use crate::model::{
  parse_price, MarkPaid, NewOrder, NewProduct, Order, OrderStatus, Product, ProductField, Settlement, StockItem,
  StockLine,
};

const PRODUCTS_FILE: &str = "products.json";
const ORDERS_FILE: &str = "orders.json";
const COUNTERS_FILE: &str = "counters.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Counters {
  #[serde(default)]
  next_stock_item_id: u64,
}

#[derive(Debug, Default)]
struct Documents {
  products: Vec<Product>,
  orders: Vec<Order>,
  counters: Counters,
}

/// Catalog and ledger kept as three JSON documents in one directory.
///
/// All state lives in memory behind a single async mutex; every mutation
/// rewrites the touched documents (temp file + rename) before the lock is
/// released, and only then commits the new state in memory. A failed write
/// therefore leaves the in-memory view unchanged.
pub struct JsonFileStore {
  dir: PathBuf,
  docs: Mutex<Documents>,
}

impl JsonFileStore {
  /// Loads (or initialises) the documents under `dir`.
  #[instrument(skip_all, fields(dir = %dir.as_ref().display()))]
  pub async fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
    let dir = dir.as_ref().to_path_buf();
    tokio::fs::create_dir_all(&dir).await?;

    let products: Vec<Product> = load_document(&dir.join(PRODUCTS_FILE)).await?;
    let orders: Vec<Order> = load_document(&dir.join(ORDERS_FILE)).await?;
    let mut counters: Counters = load_document(&dir.join(COUNTERS_FILE)).await?;

    // Never hand out an id that is already on disk, even if counters.json was lost.
    let highest = products
      .iter()
      .flat_map(|p| p.stock_items.iter().map(|s| s.id))
      .max()
      .unwrap_or(0);
    if counters.next_stock_item_id <= highest {
      counters.next_stock_item_id = highest + 1;
    }

    info!(products = products.len(), orders = orders.len(), "File store opened.");
    Ok(Self {
      dir,
      docs: Mutex::new(Documents {
        products,
        orders,
        counters,
      }),
    })
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }

  async fn save<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> StoreResult<()> {
    write_document(&self.dir, file_name, &serde_json::to_vec_pretty(value)?).await
  }

  /// Persists a settlement: the new stock state, then the paid order.
  ///
  /// If the orders write fails the previous products document is put back,
  /// so disk never shows an item sold to an order that is still PENDING. The
  /// writes run in a task of their own and finish even if the caller is dropped.
  async fn save_settlement(
    &self,
    previous: &[Product],
    products: Option<&[Product]>,
    orders: &[Order],
  ) -> StoreResult<()> {
    let dir = self.dir.clone();
    let previous = serde_json::to_vec_pretty(previous)?;
    let products = products.map(serde_json::to_vec_pretty).transpose()?;
    let orders = serde_json::to_vec_pretty(orders)?;

    let writes = tokio::spawn(async move {
      let Some(products) = products else {
        return write_document(&dir, ORDERS_FILE, &orders).await;
      };
      write_document(&dir, PRODUCTS_FILE, &products).await?;
      if let Err(e) = write_document(&dir, ORDERS_FILE, &orders).await {
        if let Err(restore) = write_document(&dir, PRODUCTS_FILE, &previous).await {
          error!(error = %restore, "Could not restore products after a failed settlement write.");
        }
        return Err(e);
      }
      Ok(())
    });
    writes
      .await
      .map_err(|e| StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
  }
}

/// Replaces `dir/file_name` with `bytes` via a temp file and a rename.
async fn write_document(dir: &Path, file_name: &str, bytes: &[u8]) -> StoreResult<()> {
  let path = dir.join(file_name);
  let tmp = dir.join(format!("{}.tmp", file_name));
  tokio::fs::write(&tmp, bytes).await?;
  tokio::fs::rename(&tmp, &path).await?;
  debug!(file = %path.display(), "Document rewritten.");
  Ok(())
}

async fn load_document<T: DeserializeOwned + Default>(path: &Path) -> StoreResult<T> {
  match tokio::fs::read(path).await {
    Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(T::default()),
    Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
    Err(e) => Err(e.into()),
  }
}

/// Marks the first unsold item of `product_id` as sold inside `products`.
fn take_first_unsold(products: &mut [Product], product_id: &str) -> Option<StockItem> {
  let product = products.iter_mut().find(|p| p.id == product_id)?;
  let item = product.stock_items.iter_mut().find(|s| !s.is_sold)?;
  item.is_sold = true;
  Some(item.clone())
}

fn mark_order_paid(orders: &mut [Order], external_id: &str, stock_item_id: Option<u64>) -> MarkPaid {
  match orders.iter_mut().find(|o| o.external_id == external_id) {
    None => MarkPaid::NotFound,
    Some(order) if order.is_paid() => MarkPaid::AlreadyPaid,
    Some(order) => {
      order.status = OrderStatus::Paid;
      order.stock_item_id = stock_item_id;
      order.paid_at = Some(Utc::now());
      MarkPaid::Paid(order.clone())
    }
  }
}

#[async_trait]
impl CatalogStore for JsonFileStore {
  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    Ok(self.docs.lock().await.products.clone())
  }

  async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
    Ok(self.docs.lock().await.products.iter().find(|p| p.id == id).cloned())
  }

  async fn available_stock(&self, product_id: &str) -> StoreResult<usize> {
    let docs = self.docs.lock().await;
    Ok(docs.products.iter().find(|p| p.id == product_id).map_or(0, Product::available))
  }

  #[instrument(skip(self, product), fields(product_id = %product.id))]
  async fn add_product(&self, product: NewProduct) -> StoreResult<Product> {
    if product.price == 0 {
      return Err(StoreError::InvalidPrice("0".to_string()));
    }
    let mut docs = self.docs.lock().await;
    if docs.products.iter().any(|p| p.id == product.id) {
      return Err(StoreError::DuplicateProduct(product.id));
    }
    let created = Product {
      id: product.id,
      name: product.name,
      price: product.price,
      description: product.description,
      stock_items: Vec::new(),
    };
    let mut products = docs.products.clone();
    products.push(created.clone());
    self.save(PRODUCTS_FILE, &products).await?;
    docs.products = products;
    info!("Product added.");
    Ok(created)
  }

  #[instrument(skip(self))]
  async fn remove_product(&self, id: &str) -> StoreResult<()> {
    let mut docs = self.docs.lock().await;
    let mut products = docs.products.clone();
    let before = products.len();
    products.retain(|p| p.id != id);
    if products.len() == before {
      return Err(StoreError::UnknownProduct(id.to_string()));
    }
    self.save(PRODUCTS_FILE, &products).await?;
    docs.products = products;
    info!("Product removed.");
    Ok(())
  }

  #[instrument(skip(self, value))]
  async fn edit_product(&self, id: &str, field: ProductField, value: &str) -> StoreResult<Product> {
    let mut docs = self.docs.lock().await;
    let mut products = docs.products.clone();
    let product = products
      .iter_mut()
      .find(|p| p.id == id)
      .ok_or_else(|| StoreError::UnknownProduct(id.to_string()))?;
    match field {
      ProductField::Name => product.name = value.trim().to_string(),
      ProductField::Price => product.price = parse_price(value)?,
      ProductField::Description => product.description = value.trim().to_string(),
    }
    let edited = product.clone();
    self.save(PRODUCTS_FILE, &products).await?;
    docs.products = products;
    info!("Product edited.");
    Ok(edited)
  }

  #[instrument(skip(self, detail))]
  async fn add_stock_item(&self, product_id: &str, detail: &str) -> StoreResult<StockItem> {
    let mut docs = self.docs.lock().await;
    let mut products = docs.products.clone();
    let mut counters = docs.counters.clone();
    let product = products
      .iter_mut()
      .find(|p| p.id == product_id)
      .ok_or_else(|| StoreError::UnknownProduct(product_id.to_string()))?;

    let item = StockItem {
      id: counters.next_stock_item_id,
      product_id: product_id.to_string(),
      detail: detail.to_string(),
      is_sold: false,
    };
    counters.next_stock_item_id += 1;
    product.stock_items.push(item.clone());

    self.save(PRODUCTS_FILE, &products).await?;
    self.save(COUNTERS_FILE, &counters).await?;
    docs.products = products;
    docs.counters = counters;
    info!(stock_item_id = item.id, "Stock item added.");
    Ok(item)
  }

  #[instrument(skip(self))]
  async fn reserve_one(&self, product_id: &str) -> StoreResult<Option<StockItem>> {
    let mut docs = self.docs.lock().await;
    let mut products = docs.products.clone();
    let Some(item) = take_first_unsold(&mut products, product_id) else {
      debug!("No unsold stock left.");
      return Ok(None);
    };
    self.save(PRODUCTS_FILE, &products).await?;
    docs.products = products;
    info!(stock_item_id = item.id, "Stock item reserved.");
    Ok(Some(item))
  }

  async fn stock_report(&self) -> StoreResult<Vec<StockLine>> {
    let docs = self.docs.lock().await;
    Ok(
      docs
        .products
        .iter()
        .map(|p| {
          let available = p.available();
          StockLine {
            product_id: p.id.clone(),
            name: p.name.clone(),
            available,
            sold: p.stock_items.len() - available,
          }
        })
        .collect(),
    )
  }
}

#[async_trait]
impl OrderLedger for JsonFileStore {
  #[instrument(skip(self, order), fields(external_id = %order.external_id))]
  async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
    let mut docs = self.docs.lock().await;
    if docs.orders.iter().any(|o| o.external_id == order.external_id) {
      return Err(StoreError::DuplicateOrder(order.external_id));
    }
    let created = Order {
      external_id: order.external_id,
      user_id: order.user_id,
      product_id: order.product_id,
      price: order.price,
      status: OrderStatus::Pending,
      stock_item_id: None,
      created_at: Utc::now(),
      paid_at: None,
    };
    let mut orders = docs.orders.clone();
    orders.push(created.clone());
    self.save(ORDERS_FILE, &orders).await?;
    docs.orders = orders;
    info!("Order recorded as PENDING.");
    Ok(created)
  }

  async fn find_order(&self, external_id: &str) -> StoreResult<Option<Order>> {
    Ok(self.docs.lock().await.orders.iter().find(|o| o.external_id == external_id).cloned())
  }

  #[instrument(skip(self))]
  async fn mark_paid(&self, external_id: &str, stock_item_id: Option<u64>) -> StoreResult<MarkPaid> {
    let mut docs = self.docs.lock().await;
    let mut orders = docs.orders.clone();
    let outcome = mark_order_paid(&mut orders, external_id, stock_item_id);
    if let MarkPaid::Paid(_) = outcome {
      self.save(ORDERS_FILE, &orders).await?;
      docs.orders = orders;
      info!("Order marked PAID.");
    }
    Ok(outcome)
  }

  #[instrument(skip(self))]
  async fn settle_order(&self, external_id: &str) -> StoreResult<Settlement> {
    let mut docs = self.docs.lock().await;

    let product_id = match docs.orders.iter().find(|o| o.external_id == external_id) {
      None => return Ok(Settlement::NotFound),
      Some(order) if order.is_paid() => return Ok(Settlement::AlreadyPaid),
      Some(order) => order.product_id.clone(),
    };

    let mut products = docs.products.clone();
    let reserved = take_first_unsold(&mut products, &product_id);

    let mut orders = docs.orders.clone();
    let order = match mark_order_paid(&mut orders, external_id, reserved.as_ref().map(|i| i.id)) {
      MarkPaid::Paid(order) => order,
      // Both were ruled out above while holding the same lock.
      MarkPaid::AlreadyPaid => return Ok(Settlement::AlreadyPaid),
      MarkPaid::NotFound => return Ok(Settlement::NotFound),
    };

    // Memory is only updated once both documents are on disk.
    let changed_products = reserved.as_ref().map(|_| products.as_slice());
    self.save_settlement(&docs.products, changed_products, &orders).await?;
    if reserved.is_some() {
      docs.products = products;
    }
    docs.orders = orders;

    Ok(match reserved {
      Some(item) => {
        info!(stock_item_id = item.id, "Order settled with stock.");
        Settlement::Fulfilled { order, item }
      }
      None => {
        warn!(product_id = %product_id, "Order settled but product is sold out.");
        Settlement::SoldOut { order }
      }
    })
  }
}
