// vendbot/bot/src/web/routes.rs

use actix_web::{web, HttpResponse};

use crate::state::AppState;
use crate::web::handlers::{telegram_handlers, webhook_handlers};

async fn index_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok()
    .content_type("text/plain; charset=utf-8")
    .body(format!("{} server is alive!", app_state.config.store_name))
}

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/", web::get().to(index_handler))
    .route("/health", web::get().to(health_check_handler))
    // Telegram pushes updates here once the webhook is registered.
    .route("/telegram", web::post().to(telegram_handlers::telegram_update_handler))
    .service(
      web::scope("/webhook")
        .route("/payment", web::post().to(webhook_handlers::payment_webhook_handler))
        // Path used by earlier deployments; same handler.
        .route("/xendit", web::post().to(webhook_handlers::payment_webhook_handler)),
    );
}
