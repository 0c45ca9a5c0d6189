// vendbot/bot/src/storefront/admin.rs
use tracing::{info, instrument};

use super::commands::AdminCommand;
use super::messages;
use vendbot_core::{Store, StoreError};

/// Applies a parsed admin command and returns the confirmation text.
#[instrument(skip_all)]
pub async fn run_admin_command(store: &dyn Store, command: AdminCommand) -> Result<String, StoreError> {
  let reply = match command {
    AdminCommand::NewProduct(new_product) => {
      let product = store.add_product(new_product).await?;
      messages::product_added(&product)
    }
    AdminCommand::AddStock { product_id, detail } => {
      store.add_stock_item(&product_id, &detail).await?;
      let available = store.available_stock(&product_id).await?;
      messages::stock_added(&product_id, available)
    }
    AdminCommand::DeleteProduct { id } => {
      store.remove_product(&id).await?;
      messages::product_removed(&id)
    }
    AdminCommand::Edit { id, field, value } => {
      let product = store.edit_product(&id, field, &value).await?;
      messages::product_edited(&product, field)
    }
    AdminCommand::InfoStock => messages::stock_report(&store.stock_report().await?),
  };
  info!("Admin command applied.");
  Ok(reply)
}
