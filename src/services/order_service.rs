use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::{
        cart::AddCartItemRequest,
        orders::{CreateOrderRequest, OrderList, OrderStats, OrderWithItems},
    },
    entity::{
        addresses::{Column as AddressCol, Entity as Addresses},
        cart_items::{self, Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::Column as ProdCol,
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    pricing,
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{cart_service, notification_service},
    state::AppState,
};

pub const ORDER_STATUSES: [&str; 5] = ["pending", "processing", "shipped", "delivered", "cancelled"];

pub fn validate_order_status(status: &str) -> Result<(), AppError> {
    if ORDER_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::Validation("Invalid order status".into()))
    }
}

/// Fixed message template per order status.
pub fn status_message(status: &str) -> &'static str {
    match status {
        "pending" => "Your order is being processed",
        "processing" => "Your order is being prepared",
        "shipped" => "Your order is on the way",
        "delivered" => "Your order has been delivered",
        "cancelled" => "Your order has been cancelled",
        _ => "Your order has been updated",
    }
}

#[derive(Debug, FromQueryResult)]
struct CartLineRow {
    product_id: Uuid,
    quantity: i32,
    price_snapshot: i64,
    variant: Value,
    product_name: String,
    inventory: i32,
}

/// Converts the user's cart into an order.
///
/// The cart read locks the joined product rows, and the inventory decrement
/// is conditional on remaining stock, so two concurrent checkouts cannot
/// both consume the same units. Everything up to the cart clear happens in
/// one transaction; a failure at any step leaves cart and catalog untouched.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let cart = Carts::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::ExpiresAt.gt(Utc::now())),
        )
        .one(&txn)
        .await?;
    let cart = match cart {
        Some(c) => c,
        None => return Err(AppError::EmptyCart),
    };

    let lines = CartItems::find()
        .select_only()
        .column(CartItemCol::ProductId)
        .column(CartItemCol::Quantity)
        .column(CartItemCol::PriceSnapshot)
        .column(CartItemCol::Variant)
        .column_as(ProdCol::Name, "product_name")
        .column(ProdCol::Inventory)
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .filter(CartItemCol::CartId.eq(cart.id))
        .lock(LockType::Update)
        .into_model::<CartLineRow>()
        .all(&txn)
        .await?;

    if lines.is_empty() {
        return Err(AppError::EmptyCart);
    }

    let address = Addresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(payload.address_id))
                .add(AddressCol::UserId.eq(user.user_id)),
        )
        .one(&txn)
        .await?;
    let address = match address {
        Some(a) => a,
        None => return Err(AppError::AddressMismatch),
    };

    // Availability is verified for every line before any write.
    for line in &lines {
        if line.inventory < line.quantity {
            return Err(AppError::InsufficientInventory(line.product_name.clone()));
        }
    }

    let amounts: Vec<(i64, i32)> = lines
        .iter()
        .map(|line| (line.price_snapshot, line.quantity))
        .collect();
    let subtotal = pricing::subtotal(&amounts);
    let discount = pricing::promo_discount(payload.promo_code.as_deref(), subtotal);
    let delivery_fee = pricing::delivery_fee(subtotal, &state.config.pricing);
    let (discount, total_amount) = pricing::order_total(subtotal, discount, delivery_fee);

    let sla_minutes = state.config.delivery_sla_minutes;
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        status: Set("pending".into()),
        payment_status: Set("pending".into()),
        total_amount: Set(total_amount),
        delivery_fee: Set(delivery_fee),
        address_snapshot: Set(serde_json::to_value(&address)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?),
        delivery_instructions: Set(payload.delivery_instructions),
        metadata: Set(Some(serde_json::json!({
            "subtotal": subtotal,
            "discount": discount,
            "promo_code": payload.promo_code,
        }))),
        estimated_delivery: Set(Some((Utc::now() + Duration::minutes(sla_minutes)).into())),
        delivered_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::with_capacity(lines.len());
    for line in &lines {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price_snapshot: Set(line.price_snapshot),
            variant: Set(line.variant.clone()),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));

        // Conditional decrement; a zero row count means a concurrent order
        // took the stock after our check, so the whole transaction unwinds.
        let decremented = Products::update_many()
            .col_expr(
                ProdCol::Inventory,
                Expr::col(ProdCol::Inventory).sub(line.quantity),
            )
            .filter(ProdCol::Id.eq(line.product_id))
            .filter(ProdCol::Inventory.gte(line.quantity))
            .exec(&txn)
            .await?;
        if decremented.rows_affected == 0 {
            return Err(AppError::InsufficientInventory(line.product_name.clone()));
        }
    }

    // The emptied cart row itself persists until it expires.
    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    let order = order_from_entity(order);
    let short_id = short_order_id(&order.id);
    if let Err(err) = notification_service::create(
        state,
        user.user_id,
        "order_update",
        "Order Placed Successfully",
        &format!(
            "Your order #{} has been placed and will be delivered in {} minutes.",
            short_id, sla_minutes
        ),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, order_id = %order.id, "order notification failed");
    }

    Ok(ApiResponse::success(
        "Order created successfully",
        OrderWithItems { order, items },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }
    if let Some(payment_status) = query.payment_status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::PaymentStatus.eq(payment_status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Owner-side cancellation; permitted only while the order is still pending.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.status != "pending" {
        return Err(AppError::Validation(
            "only pending orders can be cancelled".into(),
        ));
    }

    // The status guard in the filter makes the transition race-safe.
    let updated = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value("cancelled"))
        .col_expr(OrderCol::UpdatedAt, Expr::value(Utc::now()))
        .filter(OrderCol::Id.eq(order.id))
        .filter(OrderCol::Status.eq("pending"))
        .exec(&state.orm)
        .await?;
    if updated.rows_affected == 0 {
        return Err(AppError::Validation(
            "only pending orders can be cancelled".into(),
        ));
    }

    let order = Orders::find_by_id(order.id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let short_id = short_order_id(&order.id);
    if let Err(err) = notification_service::create(
        state,
        user.user_id,
        "order_update",
        "Order Cancelled",
        &format!("Your order #{} has been cancelled successfully.", short_id),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, order_id = %order.id, "cancel notification failed");
    }

    Ok(ApiResponse::success(
        "Order cancelled",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn order_stats(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderStats>> {
    let row: (i64, i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT COUNT(*),
               COALESCE(SUM(total_amount), 0),
               COUNT(*) FILTER (WHERE status = 'pending'),
               COUNT(*) FILTER (WHERE status = 'delivered')
        FROM orders
        WHERE user_id = $1
        "#,
    )
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    let stats = OrderStats {
        total_orders: row.0,
        total_spent: row.1,
        pending_orders: row.2,
        completed_orders: row.3,
    };
    Ok(ApiResponse::success("Stats", stats, None))
}

/// Puts a past order's lines back into the live cart at current prices.
pub async fn reorder(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    if order.is_none() {
        return Err(AppError::NotFound);
    }

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(id))
        .all(&state.orm)
        .await?;

    let mut added = 0usize;
    for item in items {
        let request = AddCartItemRequest {
            product_id: item.product_id,
            quantity: item.quantity,
            variant: Some(item.variant),
        };
        match cart_service::add_item(state, user, request).await {
            Ok(_) => added += 1,
            // Products can disappear from the catalog between orders.
            Err(AppError::Validation(_)) => continue,
            Err(err) => return Err(err),
        }
    }

    Ok(ApiResponse::success(
        "Items added to cart",
        serde_json::json!({ "added": added }),
        Some(Meta::empty()),
    ))
}

fn short_order_id(id: &Uuid) -> String {
    let text = id.to_string();
    text[text.len() - 8..].to_string()
}

pub(crate) fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        status: model.status,
        payment_status: model.payment_status,
        total_amount: model.total_amount,
        delivery_fee: model.delivery_fee,
        address_snapshot: model.address_snapshot,
        delivery_instructions: model.delivery_instructions,
        metadata: model.metadata,
        estimated_delivery: model.estimated_delivery.map(|dt| dt.with_timezone(&Utc)),
        delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price_snapshot: model.price_snapshot,
        variant: model.variant,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
