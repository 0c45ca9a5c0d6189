// vendbot/bot/src/main.rs

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use vendbot::services::{ChatTransport, TelegramClient, XenditClient};
use vendbot::web::configure_app_routes;
use vendbot::{AppConfig, AppState, StoreBackend};
use vendbot_core::{JsonFileStore, PgStore, Store};

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str()));
  let json = std::env::var("LOG_FORMAT").map(|v| v.eq_ignore_ascii_case("json")).unwrap_or(false);

  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
  match config.store_backend {
    StoreBackend::File => {
      let store = JsonFileStore::open(&config.data_dir)
        .await
        .with_context(|| format!("opening data directory {}", config.data_dir.display()))?;
      Ok(Arc::new(store))
    }
    StoreBackend::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for the postgres backend")?;
      let store = PgStore::connect(url).await.context("connecting to the database")?;
      store.migrate().await.context("creating tables")?;
      tracing::info!("Successfully connected to the database.");
      Ok(Arc::new(store))
    }
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  init_tracing();

  tracing::info!("Starting vendbot server...");

  let app_config = match AppConfig::from_env() {
    Ok(cfg) => cfg,
    Err(e) => {
      tracing::error!(error = %e, "Failed to load application configuration.");
      return Err(e.into());
    }
  };

  let store = open_store(&app_config).await?;
  let chat: Arc<dyn ChatTransport> = Arc::new(TelegramClient::new(
    &app_config.telegram_api_base,
    &app_config.telegram_token,
  )?);
  let payments = Arc::new(XenditClient::new(&app_config.xendit_base_url, &app_config.xendit_api_key)?);

  let app_state = AppState::new(app_config, store, chat.clone(), payments);

  if let Some(base_url) = &app_state.config.app_base_url {
    // Not fatal: the bot still serves the payment webhook, and the hook can be set by hand.
    let hook_url = format!("{}/telegram", base_url);
    if let Err(e) = chat
      .set_webhook(&hook_url, &app_state.config.telegram_webhook_secret)
      .await
    {
      tracing::warn!(error = %e, "Could not register the Telegram webhook.");
    }
  }

  let server_address = app_state.config.bind_address();
  tracing::info!("Attempting to bind server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await?;

  Ok(())
}
