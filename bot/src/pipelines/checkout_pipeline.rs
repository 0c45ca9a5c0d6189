// vendbot/bot/src/pipelines/checkout_pipeline.rs
use tracing::{info, instrument, warn};

use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::issue_invoice;
use crate::storefront::{messages, show};
use vendbot_core::{ContextData, FlowRegistry, NewOrder, Pipeline, StepControl};

pub fn register_checkout_pipeline(flows: &FlowRegistry<AppError>) {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("load_product", false),
    ("announce_invoice", false),
    ("issue_invoice", false),
    ("record_order", false),
    ("send_payment_link", false),
  ]);

  // Step 1: the product must exist and still have stock.
  p.on_step("load_product", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (state, chat_id, message_id, product_id) =
        ctx_data.get(|c| (c.app_state.clone(), c.chat_id, c.message_id, c.product_id.clone()));

      let Some(product) = state.store.find_product(&product_id).await? else {
        info!(%product_id, "Checkout for unknown product.");
        show(state.chat.as_ref(), chat_id, message_id, messages::PRODUCT_NOT_FOUND, None).await?;
        return Ok::<_, AppError>(StepControl::Stop);
      };
      if state.store.available_stock(&product_id).await? == 0 {
        info!(%product_id, "{}", AppError::OutOfStock(product_id.clone()));
        show(state.chat.as_ref(), chat_id, message_id, &messages::product_sold_out(&product.name), None).await?;
        return Ok(StepControl::Stop);
      }

      ctx_data.write().product = Some(product);
      Ok(StepControl::Continue)
    })
  });

  // Step 2: tell the buyer something is happening; invoice creation is a network round trip.
  p.on_step("announce_invoice", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (state, chat_id, message_id, name) = ctx_data.get(|c| {
        (
          c.app_state.clone(),
          c.chat_id,
          c.message_id,
          c.product.as_ref().map(|p| p.name.clone()).unwrap_or_default(),
        )
      });
      show(state.chat.as_ref(), chat_id, message_id, &messages::creating_invoice(&name), None).await?;
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  // Step 3: provider failures are answered here and never retried.
  p.on_step("issue_invoice", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (state, chat_id, message_id, buyer, product) = ctx_data.get(|c| {
        (
          c.app_state.clone(),
          c.chat_id,
          c.message_id,
          c.buyer.clone(),
          c.product.clone(),
        )
      });
      let product = product.ok_or_else(|| AppError::Internal("Product missing before invoicing".to_string()))?;

      match issue_invoice(state.payments.as_ref(), &state.config.order_prefix, &product, &buyer).await {
        Ok(invoice) => {
          ctx_data.write().invoice = Some(invoice);
          Ok::<_, AppError>(StepControl::Continue)
        }
        Err(e) => {
          warn!(error = %e, product_id = %product.id, user_id = buyer.user_id, "Invoice creation failed.");
          show(state.chat.as_ref(), chat_id, message_id, messages::INVOICE_FAILED, None).await?;
          Ok(StepControl::Stop)
        }
      }
    })
  });

  p.on_step("record_order", record_order);

  p.on_step("send_payment_link", |ctx_data: ContextData<CheckoutCtxData>| {
    Box::pin(async move {
      let (state, chat_id, message_id, invoice) =
        ctx_data.get(|c| (c.app_state.clone(), c.chat_id, c.message_id, c.invoice.clone()));
      let invoice = invoice.ok_or_else(|| AppError::Internal("Invoice missing before reply".to_string()))?;

      show(state.chat.as_ref(), chat_id, message_id, &messages::invoice_ready(&invoice.payment_url), None).await?;
      info!(external_id = %invoice.external_id, "Payment link sent.");
      Ok::<_, AppError>(StepControl::Continue)
    })
  });

  flows.register(p);
  info!("Checkout pipeline registered.");
}

/// Step 4: the PENDING order keeps the price the buyer was invoiced for.
#[instrument(name = "checkout_step::record_order", skip(ctx_data), err)]
async fn record_order(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<StepControl> {
  let (store, user_id, product, invoice) = ctx_data.get(|c| {
    (
      c.app_state.store.clone(),
      c.buyer.user_id,
      c.product.clone(),
      c.invoice.clone(),
    )
  });
  let (Some(product), Some(invoice)) = (product, invoice) else {
    return Err(AppError::Internal("Product or invoice missing before recording the order".to_string()));
  };

  let order = store
    .create_order(NewOrder {
      external_id: invoice.external_id,
      user_id,
      product_id: product.id,
      price: product.price,
    })
    .await?;
  info!(external_id = %order.external_id, price = order.price, "Order recorded.");
  ctx_data.write().order = Some(order);
  Ok(StepControl::Continue)
}
