// vendbot/bot/src/storefront/messages.rs

//! Every user-visible text the bot sends.

use vendbot_core::{Order, Product, ProductField, StockItem, StockLine, StoreError};

pub const BROWSE_BUTTON: &str = "🛒 Browse products";
pub const BROWSE_CALLBACK: &str = "browse";
pub const ORDER_CALLBACK_PREFIX: &str = "order:";
/// Telegram refuses buttons whose `callback_data` exceeds 64 bytes.
pub const CALLBACK_DATA_LIMIT: usize = 64;
/// Longest product id that still fits `order:{id}` into a button.
pub const MAX_PRODUCT_ID_LEN: usize = CALLBACK_DATA_LIMIT - ORDER_CALLBACK_PREFIX.len();

pub const CHOOSE_PRODUCT: &str = "Please choose the product you want:";
pub const ALL_SOLD_OUT: &str = "Sorry, all products are currently sold out.";
pub const PRODUCT_NOT_FOUND: &str = "Product not found.";
pub const INVOICE_FAILED: &str = "❌ Sorry, we could not create your invoice. Please try again later.";
pub const STOCK_UNAVAILABLE: &str = "Your payment was successful, but unfortunately our stock just ran out. \
Support will contact you shortly about a refund or another solution.";
pub const ADMIN_ONLY: &str = "⛔ This command is for the admin only.";
pub const HELP: &str = "Send /start to browse our products.";
pub const GENERIC_ERROR: &str = "⚠️ Something went wrong. Please try again later.";

pub fn welcome(store_name: &str) -> String {
  format!("👋 Welcome to {}! Please choose a menu:", store_name)
}

/// `50000` -> `"50,000"`.
pub fn format_price(price: u64) -> String {
  let digits = price.to_string();
  let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
  for (i, ch) in digits.chars().enumerate() {
    if i > 0 && (digits.len() - i) % 3 == 0 {
      grouped.push(',');
    }
    grouped.push(ch);
  }
  grouped
}

pub fn product_label(product: &Product) -> String {
  format!("{} - Rp{}", product.name, format_price(product.price))
}

pub fn product_sold_out(name: &str) -> String {
  format!("Sorry, {} is sold out.", name)
}

pub fn creating_invoice(name: &str) -> String {
  format!("⏳ Creating invoice for {}...", name)
}

pub fn invoice_ready(payment_url: &str) -> String {
  format!(
    "✅ Invoice created!\n\nPlease complete your payment through this link:\n{}",
    payment_url
  )
}

pub fn fulfilment(detail: &str) -> String {
  format!(
    "🎉 Payment received!\n\nThank you. Here are your account details:\n\n{}\n\nPlease secure your account right away.",
    detail
  )
}

pub fn admin_sale(order: &Order, item: &StockItem) -> String {
  format!(
    "✅ Sale completed!\nOrder ID: {}\nAccount: {}\nDelivered to user ID: {}",
    order.external_id, item.detail, order.user_id
  )
}

pub fn admin_shortfall(order: &Order) -> String {
  format!(
    "‼️ OUT OF STOCK ‼️\nOrder ID: {}\nProduct: {}\nPayment received but no stock left! Contact user ID {} right away.",
    order.external_id, order.product_id, order.user_id
  )
}

pub fn product_added(product: &Product) -> String {
  format!(
    "✅ Product '{}' added: {} (Rp{}).",
    product.id,
    product.name,
    format_price(product.price)
  )
}

pub fn stock_added(product_id: &str, available: usize) -> String {
  format!("✅ Stock added to '{}'. Available now: {}.", product_id, available)
}

pub fn product_removed(id: &str) -> String {
  format!("🗑️ Product '{}' removed.", id)
}

pub fn product_edited(product: &Product, field: ProductField) -> String {
  let value = match field {
    ProductField::Name => product.name.clone(),
    ProductField::Price => format!("Rp{}", format_price(product.price)),
    ProductField::Description => product.description.clone(),
  };
  format!("✏️ '{}' {} is now: {}", product.id, field, value)
}

pub fn stock_report(lines: &[StockLine]) -> String {
  if lines.is_empty() {
    return "📦 No products yet.".to_string();
  }
  let mut report = String::from("📦 Stock report\n");
  for line in lines {
    report.push_str(&format!(
      "\n{} ({}): {} available, {} sold",
      line.name, line.product_id, line.available, line.sold
    ));
  }
  report
}

/// Short explanation of a failed admin command.
pub fn store_error(err: &StoreError) -> String {
  match err {
    StoreError::DuplicateProduct(id) => format!("❌ Product '{}' already exists.", id),
    StoreError::UnknownProduct(id) => format!("❌ Product '{}' not found.", id),
    StoreError::InvalidField(_) | StoreError::InvalidPrice(_) => format!("❌ {}", err),
    _ => "❌ Storage error, check the server logs.".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn prices_are_grouped_by_thousands() {
    assert_eq!(format_price(0), "0");
    assert_eq!(format_price(999), "999");
    assert_eq!(format_price(1000), "1,000");
    assert_eq!(format_price(50000), "50,000");
    assert_eq!(format_price(1234567), "1,234,567");
  }

  #[test]
  fn storage_failures_are_not_echoed_to_chat() {
    let io = StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire"));
    assert!(!store_error(&io).contains("disk on fire"));
    assert!(store_error(&StoreError::UnknownProduct("x".into())).contains("'x' not found"));
  }
}
