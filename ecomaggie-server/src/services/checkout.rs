//! Cart checkout: one unpaid order per farmer, paid through the hosted payment page

use shared::error::{AppError, ErrorCode};
use shared::models::{CartLine, CheckoutRequest, CheckoutResponse, OrderItem, OrderTotals};
use shared::util::{self, now_millis, snowflake_id};

use crate::db;
use crate::db::orders::NewOrder;
use crate::error::ServiceResult;
use crate::payment::{SnapItem, SnapRequest};
use crate::state::AppState;

/// Pick the cart lines to buy and check they can be bought together
pub fn select_lines(lines: Vec<CartLine>, ids: Option<&[i64]>) -> Result<Vec<CartLine>, AppError> {
    let selected: Vec<CartLine> = match ids {
        Some(ids) => {
            if let Some(missing) = ids.iter().find(|id| !lines.iter().any(|l| l.id == **id)) {
                return Err(AppError::new(ErrorCode::CartItemNotFound).with_detail("cart_item_id", *missing));
            }
            lines.into_iter().filter(|l| ids.contains(&l.id)).collect()
        }
        None => lines,
    };

    let Some(first) = selected.first() else {
        return Err(AppError::new(ErrorCode::CartEmpty));
    };
    if selected.iter().any(|l| l.farmer_id != first.farmer_id) {
        return Err(AppError::new(ErrorCode::MixedFarmerCheckout));
    }
    for line in &selected {
        if !line.is_active {
            return Err(AppError::new(ErrorCode::ProductInactive).with_detail("product_id", line.product_id));
        }
        if !line.is_purchasable() {
            return Err(AppError::new(ErrorCode::ProductOutOfStock)
                .with_detail("product_id", line.product_id)
                .with_detail("stock", line.stock));
        }
    }
    Ok(selected)
}

/// Line items shown on the payment page; they must add up to the order total
pub fn snap_items(lines: &[CartLine], totals: &OrderTotals) -> Vec<SnapItem> {
    let mut items: Vec<SnapItem> = lines
        .iter()
        .map(|l| SnapItem::new(l.product_id.to_string(), l.price, l.quantity, &l.product_name))
        .collect();
    if totals.shipping_cost > 0 {
        items.push(SnapItem::new("shipping", totals.shipping_cost, 1, "Ongkos kirim"));
    }
    if totals.service_fee > 0 {
        items.push(SnapItem::new("service_fee", totals.service_fee, 1, "Biaya layanan"));
    }
    items
}

pub async fn checkout(state: &AppState, buyer_id: &str, req: &CheckoutRequest) -> ServiceResult<CheckoutResponse> {
    req.validate()?;

    let lines = db::carts::list(&state.pool, buyer_id).await?;
    let lines = select_lines(lines, req.cart_item_ids.as_deref())?;

    let address = db::addresses::find(&state.pool, buyer_id, req.address_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::AddressNotFound))?;
    let profile = db::profiles::find(&state.pool, buyer_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ProfileNotFound))?;

    let order_id = snowflake_id();
    let now = now_millis();
    let order_number = util::order_number(order_id, now);
    let totals = OrderTotals::compute(
        lines.iter().map(|l| (l.price, l.quantity)),
        req.shipping_cost,
        state.service_fee,
    )?;

    let items: Vec<OrderItem> = lines
        .iter()
        .map(|l| OrderItem {
            id: snowflake_id(),
            order_id,
            product_id: l.product_id,
            product_name: l.product_name.clone(),
            price: l.price,
            quantity: l.quantity,
        })
        .collect();
    let cart_item_ids: Vec<i64> = lines.iter().map(|l| l.id).collect();
    let shipping_address = address.to_shipping();
    let courier = req.courier.as_deref().map(str::trim).filter(|c| !c.is_empty());

    let new_order = NewOrder {
        id: order_id,
        order_number: &order_number,
        buyer_id,
        farmer_id: &lines[0].farmer_id,
        shipping_address: &shipping_address,
        subtotal: totals.subtotal,
        shipping_cost: totals.shipping_cost,
        service_fee: totals.service_fee,
        total: totals.total,
        courier,
        now,
    };
    let mut order = db::orders::create(&state.pool, &new_order, &items, &cart_item_ids).await?;
    tracing::info!(order_number = %order_number, total = totals.total, "Order created");

    let snap = SnapRequest {
        order_number: &order_number,
        gross_amount: totals.total,
        items: snap_items(&lines, &totals),
        customer_name: &profile.full_name,
        customer_phone: profile.phone.as_deref(),
        finish_url: format!("{}/orders/{}", state.site_url, order_id),
    };
    let transaction = match state.midtrans.create_transaction(&snap).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, order_number = %order_number, "Payment transaction setup failed");
            return Err(AppError::upstream(
                ErrorCode::PaymentSetupFailed,
                "payment",
                "Gagal membuat transaksi pembayaran",
            )
            .with_detail("order_id", order_id)
            .into());
        }
    };

    db::orders::set_payment(&state.pool, order_id, &transaction.token, &transaction.redirect_url, now_millis())
        .await?;
    order.payment_token = Some(transaction.token.clone());
    order.payment_redirect_url = Some(transaction.redirect_url.clone());

    Ok(CheckoutResponse {
        order,
        payment_token: transaction.token,
        redirect_url: transaction.redirect_url,
    })
}
