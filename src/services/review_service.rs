use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::reviews::{CreateReviewRequest, ReviewList, ReviewWithAuthor, UpdateReviewRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Testimonial,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(FromRow)]
struct ReviewRow {
    id: Uuid,
    product_id: Uuid,
    rating: i32,
    review: Option<String>,
    author: Option<String>,
    created_at: DateTime<Utc>,
}

pub async fn list_for_product(
    state: &AppState,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = pagination.normalize();
    let rows = sqlx::query_as::<_, ReviewRow>(
        r#"
        SELECT t.id, t.product_id, t.rating, t.review, p.full_name AS author, t.created_at
        FROM testimonials t
        LEFT JOIN profiles p ON p.user_id = t.user_id
        WHERE t.product_id = $1
        ORDER BY t.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(product_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM testimonials WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(&state.pool)
        .await?;

    let items = rows
        .into_iter()
        .map(|row| ReviewWithAuthor {
            id: row.id,
            product_id: row.product_id,
            rating: row.rating,
            review: row.review,
            author: row.author,
            created_at: row.created_at,
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Reviews", ReviewList { items }, Some(meta)))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Testimonial>> {
    validate_rating(payload.rating)?;

    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(&state.pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::Validation("product not found".into()));
    }

    let review: Testimonial = sqlx::query_as(
        r#"
        INSERT INTO testimonials (id, user_id, product_id, rating, review)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(payload.rating)
    .bind(payload.review)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Review created",
        review,
        Some(Meta::empty()),
    ))
}

pub async fn update_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateReviewRequest,
) -> AppResult<ApiResponse<Testimonial>> {
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
    }

    let review: Option<Testimonial> = sqlx::query_as(
        r#"
        UPDATE testimonials
        SET rating = COALESCE($3, rating), review = COALESCE($4, review)
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .bind(payload.rating)
    .bind(payload.review)
    .fetch_optional(&state.pool)
    .await?;

    match review {
        Some(review) => Ok(ApiResponse::success("Review updated", review, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM testimonials WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Review deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_rating(rating: i32) -> Result<(), AppError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::Validation("rating must be between 1 and 5".into()))
    }
}
