// vendbot/bot/src/storefront/commands.rs

//! Parsing of slash commands. Parsing never touches the store, so a command
//! that fails to parse has no effect at all.

use thiserror::Error;
use vendbot_core::{parse_price, NewProduct, ProductField};

use super::messages::MAX_PRODUCT_ID_LEN;

pub const NEWPRODUCT_USAGE: &str = "Usage: /newproduct id|name|price|description";
pub const PRODUCT_ID_TOO_LONG: &str = "Product id is too long (at most 58 bytes).";
pub const ADD_USAGE: &str = "Usage: /add productId detail";
pub const DELPRODUCT_USAGE: &str = "Usage: /delproduct id";
pub const EDIT_USAGE: &str = "Usage: /edit id name|price|description value";
pub const INFOSTOCK_USAGE: &str = "Usage: /infostock";

/// A text message, classified by its command word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand<'a> {
  Start,
  /// An admin command not yet authorised or parsed.
  Admin { name: &'a str, args: &'a str },
  Unknown,
}

/// The admin command could not be parsed; carries the usage line to reply with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct UsageError(pub &'static str);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
  NewProduct(NewProduct),
  AddStock { product_id: String, detail: String },
  DeleteProduct { id: String },
  Edit { id: String, field: ProductField, value: String },
  InfoStock,
}

/// Splits off the command word. `/start@shop_bot` is treated as `/start`.
pub fn parse_command(text: &str) -> ChatCommand<'_> {
  let text = text.trim();
  let Some(rest) = text.strip_prefix('/') else {
    return ChatCommand::Unknown;
  };
  let (word, args) = match rest.find(char::is_whitespace) {
    Some(at) => (&rest[..at], rest[at..].trim()),
    None => (rest, ""),
  };
  let name = word.split('@').next().unwrap_or(word);

  match name {
    "start" => ChatCommand::Start,
    "newproduct" | "add" | "delproduct" | "edit" | "infostock" => ChatCommand::Admin { name, args },
    _ => ChatCommand::Unknown,
  }
}

fn split_first_word(s: &str) -> (&str, &str) {
  match s.find(char::is_whitespace) {
    Some(at) => (&s[..at], s[at..].trim()),
    None => (s, ""),
  }
}

impl AdminCommand {
  pub fn parse(name: &str, args: &str) -> Result<Self, UsageError> {
    let args = args.trim();
    match name {
      "newproduct" => {
        let parts: Vec<&str> = args.splitn(4, '|').map(str::trim).collect();
        let &[id, product_name, price, description] = parts.as_slice() else {
          return Err(UsageError(NEWPRODUCT_USAGE));
        };
        if id.is_empty() || id.contains(char::is_whitespace) || product_name.is_empty() {
          return Err(UsageError(NEWPRODUCT_USAGE));
        }
        if id.len() > MAX_PRODUCT_ID_LEN {
          return Err(UsageError(PRODUCT_ID_TOO_LONG));
        }
        let price = parse_price(price).map_err(|_| UsageError(NEWPRODUCT_USAGE))?;
        Ok(AdminCommand::NewProduct(NewProduct {
          id: id.to_string(),
          name: product_name.to_string(),
          price,
          description: description.to_string(),
        }))
      }
      "add" => {
        let (product_id, detail) = split_first_word(args);
        if product_id.is_empty() || detail.is_empty() {
          return Err(UsageError(ADD_USAGE));
        }
        Ok(AdminCommand::AddStock {
          product_id: product_id.to_string(),
          detail: detail.to_string(),
        })
      }
      "delproduct" => {
        let (id, extra) = split_first_word(args);
        if id.is_empty() || !extra.is_empty() {
          return Err(UsageError(DELPRODUCT_USAGE));
        }
        Ok(AdminCommand::DeleteProduct { id: id.to_string() })
      }
      "edit" => {
        let (id, rest) = split_first_word(args);
        let (field, value) = split_first_word(rest);
        if id.is_empty() || value.is_empty() {
          return Err(UsageError(EDIT_USAGE));
        }
        let field = field.parse::<ProductField>().map_err(|_| UsageError(EDIT_USAGE))?;
        if field == ProductField::Price && parse_price(value).is_err() {
          return Err(UsageError(EDIT_USAGE));
        }
        Ok(AdminCommand::Edit {
          id: id.to_string(),
          field,
          value: value.to_string(),
        })
      }
      "infostock" if args.is_empty() => Ok(AdminCommand::InfoStock),
      "infostock" => Err(UsageError(INFOSTOCK_USAGE)),
      _ => Err(UsageError(NEWPRODUCT_USAGE)),
    }
  }
}
