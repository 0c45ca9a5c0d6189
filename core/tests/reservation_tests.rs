// tests/reservation_tests.rs
mod common;

use common::*;
use futures_util::future::join_all;
use std::collections::HashSet;
use vendbot_core::{CatalogStore, MarkPaid, OrderLedger, OrderStatus, Settlement, StoreError};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reserve_hands_out_each_item_once() {
  setup_tracing();
  let (_dir, store) = temp_store().await;
  let details: Vec<String> = (0..5).map(|i| format!("user{}:pass", i)).collect();
  let detail_refs: Vec<&str> = details.iter().map(String::as_str).collect();
  seed_product(&store, "netflix1", 50_000, &detail_refs).await;

  let tasks = (0..12).map(|_| {
    let store = store.clone();
    tokio::spawn(async move { store.reserve_one("netflix1").await })
  });
  let results: Vec<_> = join_all(tasks)
    .await
    .into_iter()
    .map(|joined| joined.expect("task panicked").expect("store error"))
    .collect();

  let claimed: Vec<_> = results.iter().flatten().collect();
  assert_eq!(claimed.len(), 5);
  assert_eq!(results.iter().filter(|r| r.is_none()).count(), 7);
  let unique: HashSet<u64> = claimed.iter().map(|i| i.id).collect();
  assert_eq!(unique.len(), 5);
  assert_eq!(store.available_stock("netflix1").await.unwrap(), 0);
}

#[tokio::test]
async fn test_reserve_unknown_product_is_sold_out_not_error() {
  setup_tracing();
  let (_dir, store) = temp_store().await;
  assert!(store.reserve_one("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_create_order_starts_pending_with_captured_price() {
  setup_tracing();
  let (_dir, store) = temp_store().await;
  seed_product(&store, "netflix1", 50_000, &["user:pass"]).await;
  seed_order(&store, "vendbot-netflix1-7-1", 7, "netflix1", 50_000).await;

  // A later price edit does not touch the order.
  store
    .edit_product("netflix1", vendbot_core::ProductField::Price, "99000")
    .await
    .unwrap();

  let order = store.find_order("vendbot-netflix1-7-1").await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Pending);
  assert_eq!(order.price, 50_000);
  assert_eq!(order.user_id, 7);
  assert!(order.stock_item_id.is_none());
}

#[tokio::test]
async fn test_duplicate_external_id_is_rejected() {
  setup_tracing();
  let (_dir, store) = temp_store().await;
  seed_order(&store, "x-1", 1, "p", 10).await;
  let err = store
    .create_order(vendbot_core::NewOrder {
      external_id: "x-1".into(),
      user_id: 2,
      product_id: "p".into(),
      price: 10,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, StoreError::DuplicateOrder(_)));
}

#[tokio::test]
async fn test_mark_paid_is_guarded() {
  setup_tracing();
  let (_dir, store) = temp_store().await;
  seed_order(&store, "ord-1", 1, "p", 10).await;

  match store.mark_paid("ord-1", Some(3)).await.unwrap() {
    MarkPaid::Paid(order) => {
      assert_eq!(order.status, OrderStatus::Paid);
      assert_eq!(order.stock_item_id, Some(3));
      assert!(order.paid_at.is_some());
    }
    other => panic!("expected Paid, got {:?}", other),
  }
  assert_eq!(store.mark_paid("ord-1", Some(4)).await.unwrap(), MarkPaid::AlreadyPaid);
  assert_eq!(store.find_order("ord-1").await.unwrap().unwrap().stock_item_id, Some(3));
  assert_eq!(store.mark_paid("ord-missing", None).await.unwrap(), MarkPaid::NotFound);
}

#[tokio::test]
async fn test_settle_fulfils_then_reports_already_paid() {
  setup_tracing();
  let (_dir, store) = temp_store().await;
  seed_product(&store, "netflix1", 50_000, &["user:pass", "spare:pass"]).await;
  seed_order(&store, "ord-a", 42, "netflix1", 50_000).await;

  let first = store.settle_order("ord-a").await.unwrap();
  let item = match first {
    Settlement::Fulfilled { order, item } => {
      assert_eq!(order.status, OrderStatus::Paid);
      assert_eq!(order.stock_item_id, Some(item.id));
      item
    }
    other => panic!("expected Fulfilled, got {:?}", other),
  };
  assert_eq!(item.detail, "user:pass");
  assert!(item.is_sold);

  assert_eq!(store.settle_order("ord-a").await.unwrap(), Settlement::AlreadyPaid);
  assert_eq!(store.available_stock("netflix1").await.unwrap(), 1);
}

#[tokio::test]
async fn test_settle_sold_out_marks_paid_without_reference() {
  setup_tracing();
  let (_dir, store) = temp_store().await;
  seed_product(&store, "netflix1", 50_000, &[]).await;
  seed_order(&store, "ord-b", 42, "netflix1", 50_000).await;

  match store.settle_order("ord-b").await.unwrap() {
    Settlement::SoldOut { order } => {
      assert_eq!(order.status, OrderStatus::Paid);
      assert!(order.stock_item_id.is_none());
    }
    other => panic!("expected SoldOut, got {:?}", other),
  }
  assert_eq!(store.settle_order("missing").await.unwrap(), Settlement::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_settlement_of_same_order_consumes_one_item() {
  setup_tracing();
  let (_dir, store) = temp_store().await;
  seed_product(&store, "netflix1", 50_000, &["a:1", "b:2", "c:3"]).await;
  seed_order(&store, "ord-c", 9, "netflix1", 50_000).await;

  let tasks = (0..8).map(|_| {
    let store = store.clone();
    tokio::spawn(async move { store.settle_order("ord-c").await })
  });
  let outcomes: Vec<Settlement> = join_all(tasks)
    .await
    .into_iter()
    .map(|joined| joined.expect("task panicked").expect("store error"))
    .collect();

  let fulfilled = outcomes.iter().filter(|o| matches!(o, Settlement::Fulfilled { .. })).count();
  let already = outcomes.iter().filter(|o| matches!(o, Settlement::AlreadyPaid)).count();
  assert_eq!(fulfilled, 1);
  assert_eq!(already, 7);
  assert_eq!(store.available_stock("netflix1").await.unwrap(), 2);
}

#[tokio::test]
async fn test_failed_settlement_write_consumes_no_stock() {
  setup_tracing();
  let (dir, store) = temp_store().await;
  seed_product(&store, "netflix1", 50_000, &["a:1", "b:2"]).await;
  seed_order(&store, "x-1", 7, "netflix1", 50_000).await;

  // A non-empty directory where orders.json should be makes the orders write fail.
  let orders_path = dir.path().join("orders.json");
  std::fs::remove_file(&orders_path).unwrap();
  std::fs::create_dir(&orders_path).unwrap();
  std::fs::write(orders_path.join("blocker"), b"x").unwrap();

  let result = store.settle_order("x-1").await;
  assert!(matches!(result, Err(StoreError::Io(_))), "got {:?}", result);
  assert_eq!(store.available_stock("netflix1").await.unwrap(), 2);
  assert_eq!(store.find_order("x-1").await.unwrap().unwrap().status, OrderStatus::Pending);

  let on_disk: Vec<vendbot_core::Product> =
    serde_json::from_slice(&std::fs::read(dir.path().join("products.json")).unwrap()).unwrap();
  assert_eq!(on_disk[0].available(), 2, "products.json must be restored");

  // Redelivery after the fault clears hands out the first item, not the second.
  std::fs::remove_dir_all(&orders_path).unwrap();
  let item = match store.settle_order("x-1").await.unwrap() {
    Settlement::Fulfilled { item, .. } => item,
    other => panic!("expected Fulfilled, got {:?}", other),
  };
  assert_eq!(item.detail, "a:1");
  assert_eq!(store.available_stock("netflix1").await.unwrap(), 1);

  let reopened = vendbot_core::JsonFileStore::open(dir.path()).await.unwrap();
  let order = reopened.find_order("x-1").await.unwrap().unwrap();
  assert_eq!(order.status, OrderStatus::Paid);
  assert_eq!(order.stock_item_id, Some(item.id));
  assert_eq!(reopened.available_stock("netflix1").await.unwrap(), 1);
}
