use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::cart::{AddCartItemRequest, CartLine, CartLineProduct, CartWithTotals, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct LineWithProductRow {
    item_id: Uuid,
    quantity: i32,
    price_snapshot: i64,
    variant: Value,
    product_id: Uuid,
    name: String,
    price: i64,
    image_url: Option<String>,
    inventory: i32,
}

/// Returns the user's live cart, creating one when none exists or the last
/// one has expired. At most one live cart per user.
pub async fn get_or_create_cart(state: &AppState, user: &AuthUser) -> AppResult<Cart> {
    let existing: Option<Cart> = sqlx::query_as(
        "SELECT * FROM carts WHERE user_id = $1 AND expires_at > now() ORDER BY expires_at DESC LIMIT 1",
    )
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?;

    if let Some(cart) = existing {
        return Ok(cart);
    }

    let expires_at: DateTime<Utc> = Utc::now() + Duration::days(state.config.cart_ttl_days);
    let cart: Cart = sqlx::query_as(
        "INSERT INTO carts (id, user_id, expires_at) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(expires_at)
    .fetch_one(&state.pool)
    .await?;

    Ok(cart)
}

pub async fn get_cart_with_totals(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<CartWithTotals>> {
    let cart = get_or_create_cart(state, user).await?;

    let rows = sqlx::query_as::<_, LineWithProductRow>(
        r#"
        SELECT ci.id AS item_id, ci.quantity, ci.price_snapshot, ci.variant,
               p.id AS product_id, p.name, p.price, p.image_url, p.inventory
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.created_at
        "#,
    )
    .bind(cart.id)
    .fetch_all(&state.pool)
    .await?;

    // Totals are derived from the lines on every read, never stored.
    let total_amount: i64 = rows
        .iter()
        .map(|row| row.price_snapshot * row.quantity as i64)
        .sum();
    let total_items: i64 = rows.iter().map(|row| row.quantity as i64).sum();

    let items = rows
        .into_iter()
        .map(|row| CartLine {
            id: row.item_id,
            product: CartLineProduct {
                id: row.product_id,
                name: row.name,
                price: row.price,
                image_url: row.image_url,
                inventory: row.inventory,
            },
            quantity: row.quantity,
            price_snapshot: row.price_snapshot,
            variant: row.variant,
        })
        .collect();

    let data = CartWithTotals {
        cart,
        items,
        total_amount,
        total_items,
    };
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Adds a line to the cart. A repeated add of the same (product, variant)
/// increments the existing line instead of inserting a duplicate; the price
/// snapshot is frozen at first add.
pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let cart = get_or_create_cart(state, user).await?;

    let product: Option<(i64,)> =
        sqlx::query_as("SELECT price FROM products WHERE id = $1 AND is_active")
            .bind(payload.product_id)
            .fetch_optional(&state.pool)
            .await?;
    let Some((price,)) = product else {
        return Err(AppError::Validation("product not found".to_string()));
    };

    let variant = payload.variant.unwrap_or_else(|| serde_json::json!({}));

    // Upsert against the (cart, product, variant) unique constraint, so
    // concurrent adds of the same line merge instead of racing. The price
    // snapshot stays frozen at first add.
    let item: CartItem = sqlx::query_as(
        r#"
        INSERT INTO cart_items (id, cart_id, product_id, quantity, price_snapshot, variant)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (cart_id, product_id, variant)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(cart.id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .bind(price)
    .bind(&variant)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("OK", item, None))
}

/// Sets the line quantity; zero or below removes the line.
pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Option<CartItem>>> {
    if payload.quantity <= 0 {
        remove_item(state, user, item_id).await?;
        return Ok(ApiResponse::success(
            "Removed from cart",
            None,
            Some(Meta::empty()),
        ));
    }

    let item: Option<CartItem> = sqlx::query_as(
        r#"
        UPDATE cart_items ci
        SET quantity = $3
        FROM carts c
        WHERE ci.id = $2 AND ci.cart_id = c.id AND c.user_id = $1
        RETURNING ci.*
        "#,
    )
    .bind(user.user_id)
    .bind(item_id)
    .bind(payload.quantity)
    .fetch_optional(&state.pool)
    .await?;

    match item {
        Some(item) => Ok(ApiResponse::success("OK", Some(item), None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query(
        r#"
        DELETE FROM cart_items ci
        USING carts c
        WHERE ci.id = $2 AND ci.cart_id = c.id AND c.user_id = $1
        "#,
    )
    .bind(user.user_id)
    .bind(item_id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let cart = get_or_create_cart(state, user).await?;

    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
