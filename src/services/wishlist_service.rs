use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::wishlist::{WishlistItem, WishlistItems, WishlistMembership},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Product, WishlistEntry},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct WishlistRow {
    entry_id: Uuid,
    entry_created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: Product,
}

pub async fn list_wishlist(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<WishlistItems>> {
    let rows = sqlx::query_as::<_, WishlistRow>(
        r#"
        SELECT w.id AS entry_id, w.created_at AS entry_created_at, p.*
        FROM wishlists w
        JOIN products p ON p.id = w.product_id
        WHERE w.user_id = $1
        ORDER BY w.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let items = rows
        .into_iter()
        .map(|row| WishlistItem {
            id: row.entry_id,
            product: row.product,
            created_at: row.entry_created_at,
        })
        .collect();

    Ok(ApiResponse::success("Wishlist", WishlistItems { items }, None))
}

/// Membership add is idempotent: a repeated add returns the existing entry.
pub async fn add_to_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<WishlistEntry>> {
    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&state.pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::Validation("product not found".into()));
    }

    let entry: WishlistEntry = sqlx::query_as(
        r#"
        INSERT INTO wishlists (id, user_id, product_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, product_id) DO UPDATE SET product_id = EXCLUDED.product_id
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(product_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Added to wishlist",
        entry,
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM wishlists WHERE user_id = $1 AND product_id = $2")
        .bind(user.user_id)
        .bind(product_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Removed from wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn is_in_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<bool> {
    let row: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM wishlists WHERE user_id = $1 AND product_id = $2")
            .bind(user.user_id)
            .bind(product_id)
            .fetch_optional(&state.pool)
            .await?;
    Ok(row.is_some())
}

/// Flips membership; applying it twice restores the original state.
pub async fn toggle_wishlist(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<WishlistMembership>> {
    let membership = if is_in_wishlist(state, user, product_id).await? {
        remove_from_wishlist(state, user, product_id).await?;
        false
    } else {
        add_to_wishlist(state, user, product_id).await?;
        true
    };

    Ok(ApiResponse::success(
        "OK",
        WishlistMembership {
            in_wishlist: membership,
        },
        Some(Meta::empty()),
    ))
}
