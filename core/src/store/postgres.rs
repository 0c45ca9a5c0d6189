// vendbot/core/src/store/postgres.rs

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, PgExecutor};
use tracing::{info, instrument, warn};

use super::{CatalogStore, OrderLedger};
use crate::error::{StoreError, StoreResult};
use crate::model::{
  parse_price, MarkPaid, NewOrder, NewProduct, Order, OrderStatus, Product, ProductField, Settlement, StockItem,
  StockLine,
};

const SCHEMA: &[&str] = &[
  "CREATE TABLE IF NOT EXISTS products (
     id TEXT PRIMARY KEY,
     name TEXT NOT NULL,
     price BIGINT NOT NULL CHECK (price > 0),
     description TEXT NOT NULL DEFAULT '',
     seq BIGSERIAL
   )",
  "CREATE TABLE IF NOT EXISTS stock_items (
     id BIGSERIAL PRIMARY KEY,
     product_id TEXT NOT NULL REFERENCES products(id) ON DELETE CASCADE,
     detail TEXT NOT NULL,
     is_sold BOOLEAN NOT NULL DEFAULT FALSE
   )",
  "CREATE INDEX IF NOT EXISTS stock_items_unsold_idx ON stock_items (product_id, id) WHERE is_sold = FALSE",
  "CREATE TABLE IF NOT EXISTS orders (
     external_id TEXT PRIMARY KEY,
     user_id BIGINT NOT NULL,
     product_id TEXT NOT NULL,
     price BIGINT NOT NULL,
     status TEXT NOT NULL DEFAULT 'PENDING',
     stock_item_id BIGINT,
     created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
     paid_at TIMESTAMPTZ
   )",
];

const ORDER_COLUMNS: &str = "external_id, user_id, product_id, price, status, stock_item_id, created_at, paid_at";

// Conditional update: only an unsold row can be claimed, and SKIP LOCKED keeps
// concurrent claimers on different rows.
const RESERVE_ONE_SQL: &str = "UPDATE stock_items SET is_sold = TRUE
   WHERE is_sold = FALSE AND id = (
     SELECT id FROM stock_items
     WHERE product_id = $1 AND is_sold = FALSE
     ORDER BY id
     LIMIT 1
     FOR UPDATE SKIP LOCKED)
   RETURNING id, product_id, detail, is_sold";

#[derive(Debug, FromRow)]
struct ProductRow {
  id: String,
  name: String,
  price: i64,
  description: String,
}

impl TryFrom<ProductRow> for Product {
  type Error = StoreError;

  fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
    Ok(Product {
      price: from_db_amount(row.price)?,
      id: row.id,
      name: row.name,
      description: row.description,
      stock_items: Vec::new(),
    })
  }
}

#[derive(Debug, FromRow)]
struct StockItemRow {
  id: i64,
  product_id: String,
  detail: String,
  is_sold: bool,
}

impl TryFrom<StockItemRow> for StockItem {
  type Error = StoreError;

  fn try_from(row: StockItemRow) -> Result<Self, Self::Error> {
    Ok(StockItem {
      id: from_db_amount(row.id)?,
      product_id: row.product_id,
      detail: row.detail,
      is_sold: row.is_sold,
    })
  }
}

#[derive(Debug, FromRow)]
struct OrderRow {
  external_id: String,
  user_id: i64,
  product_id: String,
  price: i64,
  status: String,
  stock_item_id: Option<i64>,
  created_at: chrono::DateTime<chrono::Utc>,
  paid_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl TryFrom<OrderRow> for Order {
  type Error = StoreError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    Ok(Order {
      status: row.status.parse::<OrderStatus>()?,
      price: from_db_amount(row.price)?,
      stock_item_id: row.stock_item_id.map(from_db_amount).transpose()?,
      external_id: row.external_id,
      user_id: row.user_id,
      product_id: row.product_id,
      created_at: row.created_at,
      paid_at: row.paid_at,
    })
  }
}

#[derive(Debug, FromRow)]
struct StockLineRow {
  id: String,
  name: String,
  available: i64,
  sold: i64,
}

fn from_db_amount(value: i64) -> StoreResult<u64> {
  u64::try_from(value).map_err(|_| StoreError::Corrupt(format!("negative value {}", value)))
}

fn to_db_amount(value: u64) -> StoreResult<i64> {
  i64::try_from(value).map_err(|_| StoreError::InvalidPrice(value.to_string()))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
  matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

async fn reserve_with<'e, E: PgExecutor<'e>>(executor: E, product_id: &str) -> StoreResult<Option<StockItem>> {
  let row = sqlx::query_as::<_, StockItemRow>(RESERVE_ONE_SQL)
    .bind(product_id)
    .fetch_optional(executor)
    .await?;
  row.map(StockItem::try_from).transpose()
}

async fn mark_paid_with<'e, E: PgExecutor<'e>>(
  executor: E,
  external_id: &str,
  stock_item_id: Option<u64>,
) -> StoreResult<Option<Order>> {
  let stock_item_id = stock_item_id.map(to_db_amount).transpose()?;
  let sql = format!(
    "UPDATE orders SET status = 'PAID', stock_item_id = $2, paid_at = now()
     WHERE external_id = $1 AND status = 'PENDING'
     RETURNING {}",
    ORDER_COLUMNS
  );
  let row = sqlx::query_as::<_, OrderRow>(&sql)
    .bind(external_id)
    .bind(stock_item_id)
    .fetch_optional(executor)
    .await?;
  row.map(Order::try_from).transpose()
}

/// Catalog and ledger in Postgres tables `products`, `stock_items` and `orders`.
///
/// Atomicity is delegated to the database: reservation is a conditional
/// update and settlement runs in one transaction holding the order row lock,
/// so several bot processes may share the same database.
#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(database_url: &str) -> StoreResult<Self> {
    let pool = PgPoolOptions::new().max_connections(5).connect(database_url).await?;
    info!("Connected to the database.");
    Ok(Self::new(pool))
  }

  /// Creates the tables if they are missing.
  pub async fn migrate(&self) -> StoreResult<()> {
    for statement in SCHEMA {
      sqlx::query(statement).execute(&self.pool).await?;
    }
    info!("Database schema ensured.");
    Ok(())
  }

  async fn fetch_order<'e, E: PgExecutor<'e>>(executor: E, external_id: &str, lock: bool) -> StoreResult<Option<Order>> {
    let sql = format!(
      "SELECT {} FROM orders WHERE external_id = $1{}",
      ORDER_COLUMNS,
      if lock { " FOR UPDATE" } else { "" }
    );
    let row = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(external_id)
      .fetch_optional(executor)
      .await?;
    row.map(Order::try_from).transpose()
  }
}

#[async_trait]
impl CatalogStore for PgStore {
  async fn list_products(&self) -> StoreResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>("SELECT id, name, price, description FROM products ORDER BY seq")
      .fetch_all(&self.pool)
      .await?;
    rows.into_iter().map(Product::try_from).collect()
  }

  async fn find_product(&self, id: &str) -> StoreResult<Option<Product>> {
    let row = sqlx::query_as::<_, ProductRow>("SELECT id, name, price, description FROM products WHERE id = $1")
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    row.map(Product::try_from).transpose()
  }

  async fn available_stock(&self, product_id: &str) -> StoreResult<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_items WHERE product_id = $1 AND is_sold = FALSE")
      .bind(product_id)
      .fetch_one(&self.pool)
      .await?;
    Ok(from_db_amount(count)? as usize)
  }

  #[instrument(skip(self, product), fields(product_id = %product.id))]
  async fn add_product(&self, product: NewProduct) -> StoreResult<Product> {
    if product.price == 0 {
      return Err(StoreError::InvalidPrice("0".to_string()));
    }
    let result = sqlx::query_as::<_, ProductRow>(
      "INSERT INTO products (id, name, price, description) VALUES ($1, $2, $3, $4)
       RETURNING id, name, price, description",
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(to_db_amount(product.price)?)
    .bind(&product.description)
    .fetch_one(&self.pool)
    .await;
    match result {
      Ok(row) => Product::try_from(row),
      Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateProduct(product.id)),
      Err(e) => Err(e.into()),
    }
  }

  #[instrument(skip(self))]
  async fn remove_product(&self, id: &str) -> StoreResult<()> {
    let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.pool).await?;
    if done.rows_affected() == 0 {
      return Err(StoreError::UnknownProduct(id.to_string()));
    }
    Ok(())
  }

  #[instrument(skip(self, value))]
  async fn edit_product(&self, id: &str, field: ProductField, value: &str) -> StoreResult<Product> {
    let returning = "RETURNING id, name, price, description";
    let query = match field {
      ProductField::Price => {
        let price = to_db_amount(parse_price(value)?)?;
        sqlx::query_as::<_, ProductRow>(&format!("UPDATE products SET price = $2 WHERE id = $1 {}", returning))
          .bind(id)
          .bind(price)
          .fetch_optional(&self.pool)
          .await?
      }
      ProductField::Name | ProductField::Description => {
        // Column name comes from the closed ProductField enum, never from input.
        let sql = format!("UPDATE products SET {} = $2 WHERE id = $1 {}", field, returning);
        sqlx::query_as::<_, ProductRow>(&sql)
          .bind(id)
          .bind(value.trim())
          .fetch_optional(&self.pool)
          .await?
      }
    };
    query
      .map(Product::try_from)
      .transpose()?
      .ok_or_else(|| StoreError::UnknownProduct(id.to_string()))
  }

  #[instrument(skip(self, detail))]
  async fn add_stock_item(&self, product_id: &str, detail: &str) -> StoreResult<StockItem> {
    let result = sqlx::query_as::<_, StockItemRow>(
      "INSERT INTO stock_items (product_id, detail) VALUES ($1, $2)
       RETURNING id, product_id, detail, is_sold",
    )
    .bind(product_id)
    .bind(detail)
    .fetch_one(&self.pool)
    .await;
    match result {
      Ok(row) => StockItem::try_from(row),
      Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
        Err(StoreError::UnknownProduct(product_id.to_string()))
      }
      Err(e) => Err(e.into()),
    }
  }

  #[instrument(skip(self))]
  async fn reserve_one(&self, product_id: &str) -> StoreResult<Option<StockItem>> {
    reserve_with(&self.pool, product_id).await
  }

  async fn stock_report(&self) -> StoreResult<Vec<StockLine>> {
    let rows = sqlx::query_as::<_, StockLineRow>(
      "SELECT p.id, p.name,
              COUNT(s.id) FILTER (WHERE s.is_sold = FALSE) AS available,
              COUNT(s.id) FILTER (WHERE s.is_sold = TRUE) AS sold
       FROM products p LEFT JOIN stock_items s ON s.product_id = p.id
       GROUP BY p.id, p.name, p.seq
       ORDER BY p.seq",
    )
    .fetch_all(&self.pool)
    .await?;
    rows
      .into_iter()
      .map(|r| {
        Ok(StockLine {
          product_id: r.id,
          name: r.name,
          available: from_db_amount(r.available)? as usize,
          sold: from_db_amount(r.sold)? as usize,
        })
      })
      .collect()
  }
}

#[async_trait]
impl OrderLedger for PgStore {
  #[instrument(skip(self, order), fields(external_id = %order.external_id))]
  async fn create_order(&self, order: NewOrder) -> StoreResult<Order> {
    let sql = format!(
      "INSERT INTO orders (external_id, user_id, product_id, price, status)
       VALUES ($1, $2, $3, $4, 'PENDING')
       RETURNING {}",
      ORDER_COLUMNS
    );
    let result = sqlx::query_as::<_, OrderRow>(&sql)
      .bind(&order.external_id)
      .bind(order.user_id)
      .bind(&order.product_id)
      .bind(to_db_amount(order.price)?)
      .fetch_one(&self.pool)
      .await;
    match result {
      Ok(row) => Order::try_from(row),
      Err(e) if is_unique_violation(&e) => Err(StoreError::DuplicateOrder(order.external_id)),
      Err(e) => Err(e.into()),
    }
  }

  async fn find_order(&self, external_id: &str) -> StoreResult<Option<Order>> {
    Self::fetch_order(&self.pool, external_id, false).await
  }

  #[instrument(skip(self))]
  async fn mark_paid(&self, external_id: &str, stock_item_id: Option<u64>) -> StoreResult<MarkPaid> {
    if let Some(order) = mark_paid_with(&self.pool, external_id, stock_item_id).await? {
      return Ok(MarkPaid::Paid(order));
    }
    Ok(match Self::fetch_order(&self.pool, external_id, false).await? {
      Some(_) => MarkPaid::AlreadyPaid,
      None => MarkPaid::NotFound,
    })
  }

  #[instrument(skip(self))]
  async fn settle_order(&self, external_id: &str) -> StoreResult<Settlement> {
    let mut tx = self.pool.begin().await?;

    let order = match Self::fetch_order(&mut *tx, external_id, true).await? {
      None => return Ok(Settlement::NotFound),
      Some(order) if order.is_paid() => return Ok(Settlement::AlreadyPaid),
      Some(order) => order,
    };

    let reserved = reserve_with(&mut *tx, &order.product_id).await?;
    let paid = mark_paid_with(&mut *tx, external_id, reserved.as_ref().map(|i| i.id)).await?;
    let Some(paid) = paid else {
      // The row lock makes this unreachable; dropping `tx` rolls the reservation back.
      return Ok(Settlement::AlreadyPaid);
    };
    tx.commit().await?;

    Ok(match reserved {
      Some(item) => {
        info!(stock_item_id = item.id, "Order settled with stock.");
        Settlement::Fulfilled { order: paid, item }
      }
      None => {
        warn!(product_id = %paid.product_id, "Order settled but product is sold out.");
        Settlement::SoldOut { order: paid }
      }
    })
  }
}
