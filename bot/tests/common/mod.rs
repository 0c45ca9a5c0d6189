// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tracing::Level;

use vendbot::services::{ChatTransport, Invoice, InvoiceRequest, Keyboard, PaymentGateway};
use vendbot::{AppConfig, AppError, AppState, StoreBackend};
use vendbot_core::{CatalogStore, JsonFileStore, NewProduct};

pub const ADMIN_ID: i64 = 1000;
pub const BUYER_ID: i64 = 42;
pub const WEBHOOK_TOKEN: &str = "test-callback-token";
pub const TELEGRAM_SECRET: &str = "test-telegram-secret";

// --- Tracing, once per test binary ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Recording chat transport ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
  Message {
    chat_id: i64,
    text: String,
    keyboard: Option<Keyboard>,
  },
  Photo {
    chat_id: i64,
    photo_url: String,
    caption: String,
    keyboard: Option<Keyboard>,
  },
  Edit {
    chat_id: i64,
    message_id: i64,
    text: String,
    keyboard: Option<Keyboard>,
  },
  CallbackAnswer {
    callback_id: String,
  },
  Webhook {
    url: String,
    secret_token: String,
  },
}

impl Outbound {
  pub fn chat_id(&self) -> Option<i64> {
    match self {
      Outbound::Message { chat_id, .. } | Outbound::Photo { chat_id, .. } | Outbound::Edit { chat_id, .. } => {
        Some(*chat_id)
      }
      _ => None,
    }
  }

  pub fn text(&self) -> Option<&str> {
    match self {
      Outbound::Message { text, .. } | Outbound::Edit { text, .. } => Some(text),
      Outbound::Photo { caption, .. } => Some(caption),
      _ => None,
    }
  }

  pub fn keyboard(&self) -> Option<&Keyboard> {
    match self {
      Outbound::Message { keyboard, .. } | Outbound::Photo { keyboard, .. } | Outbound::Edit { keyboard, .. } => {
        keyboard.as_ref()
      }
      _ => None,
    }
  }
}

/// Records every outbound call instead of talking to Telegram.
#[derive(Default)]
pub struct RecordingChat {
  sent: Mutex<Vec<Outbound>>,
  unreachable: Mutex<Vec<i64>>,
}

impl RecordingChat {
  pub fn sent(&self) -> Vec<Outbound> {
    self.sent.lock().unwrap().clone()
  }

  /// Makes every later send to `chat_id` fail, as if the user blocked the bot.
  pub fn make_unreachable(&self, chat_id: i64) {
    self.unreachable.lock().unwrap().push(chat_id);
  }

  pub fn clear(&self) {
    self.sent.lock().unwrap().clear();
  }

  /// Texts (messages, edits and captions) addressed to `chat_id`, oldest first.
  pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
    self
      .sent()
      .iter()
      .filter(|o| o.chat_id() == Some(chat_id))
      .filter_map(|o| o.text().map(str::to_string))
      .collect()
  }

  pub fn last_to(&self, chat_id: i64) -> Option<Outbound> {
    self.sent().into_iter().rev().find(|o| o.chat_id() == Some(chat_id))
  }

  fn push(&self, outbound: Outbound) {
    self.sent.lock().unwrap().push(outbound);
  }
}

#[async_trait]
impl ChatTransport for RecordingChat {
  async fn send_message(&self, chat_id: i64, text: &str, keyboard: Option<Keyboard>) -> Result<(), AppError> {
    if self.unreachable.lock().unwrap().contains(&chat_id) {
      return Err(AppError::Chat(format!("Forbidden: bot was blocked by user {}", chat_id)));
    }
    self.push(Outbound::Message {
      chat_id,
      text: text.to_string(),
      keyboard,
    });
    Ok(())
  }

  async fn send_photo(
    &self,
    chat_id: i64,
    photo_url: &str,
    caption: &str,
    keyboard: Option<Keyboard>,
  ) -> Result<(), AppError> {
    self.push(Outbound::Photo {
      chat_id,
      photo_url: photo_url.to_string(),
      caption: caption.to_string(),
      keyboard,
    });
    Ok(())
  }

  async fn edit_message(
    &self,
    chat_id: i64,
    message_id: i64,
    text: &str,
    keyboard: Option<Keyboard>,
  ) -> Result<(), AppError> {
    self.push(Outbound::Edit {
      chat_id,
      message_id,
      text: text.to_string(),
      keyboard,
    });
    Ok(())
  }

  async fn answer_callback(&self, callback_id: &str) -> Result<(), AppError> {
    self.push(Outbound::CallbackAnswer {
      callback_id: callback_id.to_string(),
    });
    Ok(())
  }

  async fn set_webhook(&self, url: &str, secret_token: &str) -> Result<(), AppError> {
    self.push(Outbound::Webhook {
      url: url.to_string(),
      secret_token: secret_token.to_string(),
    });
    Ok(())
  }
}

// --- Scripted payment gateway ---

/// Hands out predictable invoices, or fails when told to.
#[derive(Default)]
pub struct ScriptedGateway {
  fail: AtomicBool,
  issued: AtomicUsize,
  requests: Mutex<Vec<InvoiceRequest>>,
}

impl ScriptedGateway {
  pub fn fail_next_calls(&self, fail: bool) {
    self.fail.store(fail, Ordering::SeqCst);
  }

  pub fn requests(&self) -> Vec<InvoiceRequest> {
    self.requests.lock().unwrap().clone()
  }

  pub fn last_external_id(&self) -> String {
    self.requests().last().expect("an invoice was requested").external_id.clone()
  }
}

#[async_trait]
impl PaymentGateway for ScriptedGateway {
  async fn create_invoice(&self, request: &InvoiceRequest) -> Result<Invoice, AppError> {
    self.requests.lock().unwrap().push(request.clone());
    if self.fail.load(Ordering::SeqCst) {
      return Err(AppError::InvoiceCreation("scripted failure".to_string()));
    }
    let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
    Ok(Invoice {
      id: format!("inv-{}", n),
      invoice_url: format!("https://checkout.xendit.test/{}", request.external_id),
    })
  }
}

// --- App state wiring ---

pub fn test_config(data_dir: &Path) -> AppConfig {
  AppConfig {
    server_host: "127.0.0.1".to_string(),
    server_port: 0,
    app_base_url: None,
    telegram_token: "test-telegram-token".to_string(),
    telegram_api_base: "http://telegram.invalid".to_string(),
    telegram_webhook_secret: TELEGRAM_SECRET.to_string(),
    admin_chat_id: ADMIN_ID,
    xendit_api_key: "xnd_test_key".to_string(),
    xendit_base_url: "http://xendit.invalid".to_string(),
    xendit_webhook_token: WEBHOOK_TOKEN.to_string(),
    store_name: "Test Store".to_string(),
    logo_url: None,
    order_prefix: "vendbot".to_string(),
    store_backend: StoreBackend::File,
    data_dir: data_dir.to_path_buf(),
    database_url: None,
  }
}

/// Everything a test needs, backed by a file store in a temp dir.
pub struct Harness {
  pub dir: TempDir,
  pub state: AppState,
  pub store: Arc<JsonFileStore>,
  pub chat: Arc<RecordingChat>,
  pub payments: Arc<ScriptedGateway>,
}

pub async fn harness() -> Harness {
  harness_with(|_| {}).await
}

pub async fn harness_with(tweak: impl FnOnce(&mut AppConfig)) -> Harness {
  setup_tracing();
  let dir = tempfile::tempdir().expect("create temp dir");
  let store = Arc::new(JsonFileStore::open(dir.path()).await.expect("open store"));
  let chat = Arc::new(RecordingChat::default());
  let payments = Arc::new(ScriptedGateway::default());

  let mut config = test_config(dir.path());
  tweak(&mut config);
  let state = AppState::new(config, store.clone(), chat.clone(), payments.clone());

  Harness {
    dir,
    state,
    store,
    chat,
    payments,
  }
}

/// Adds a product named `name` with one stock item per entry of `details`.
pub async fn seed_product(store: &JsonFileStore, id: &str, name: &str, price: u64, details: &[&str]) {
  store
    .add_product(NewProduct {
      id: id.to_string(),
      name: name.to_string(),
      price,
      description: format!("{} description", name),
    })
    .await
    .expect("add product");
  for detail in details {
    store.add_stock_item(id, detail).await.expect("add stock");
  }
}

// --- Inbound payloads ---

pub fn text_update(update_id: i64, from_id: i64, text: &str) -> Value {
  json!({
    "update_id": update_id,
    "message": {
      "message_id": update_id * 10,
      "date": 0,
      "from": {"id": from_id, "is_bot": false, "first_name": "Test", "last_name": "User"},
      "chat": {"id": from_id, "type": "private"},
      "text": text
    }
  })
}

pub fn callback_update(update_id: i64, from_id: i64, message_id: i64, data: &str) -> Value {
  json!({
    "update_id": update_id,
    "callback_query": {
      "id": format!("cb-{}", update_id),
      "chat_instance": "ci",
      "from": {"id": from_id, "is_bot": false, "first_name": "Budi", "last_name": "Santoso"},
      "message": {
        "message_id": message_id,
        "date": 0,
        "chat": {"id": from_id, "type": "private"},
        "text": "Please choose the product you want:"
      },
      "data": data
    }
  })
}

/// A Telegram delivery of `update`, carrying the configured secret token.
pub fn telegram_request(update: &Value) -> actix_web::test::TestRequest {
  actix_web::test::TestRequest::post()
    .uri("/telegram")
    .insert_header(("x-telegram-bot-api-secret-token", TELEGRAM_SECRET))
    .set_json(update)
}

pub fn paid_notice(external_id: &str) -> Value {
  json!({
    "id": "inv-callback",
    "external_id": external_id,
    "status": "PAID",
    "amount": 50000,
    "paid_at": "2026-01-01T00:00:00.000Z"
  })
}

/// Builds the actix test service with the production routes and `state`.
macro_rules! init_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .configure(vendbot::web::configure_app_routes),
    )
    .await
  };
}
#[allow(unused_imports)]
pub(crate) use init_app;
