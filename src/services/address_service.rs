use uuid::Uuid;

use crate::{
    dto::addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items: Vec<Address> = sqlx::query_as(
        "SELECT * FROM addresses WHERE user_id = $1 ORDER BY is_default DESC, created_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success("Addresses", AddressList { items }, None))
}

pub async fn get_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let address: Option<Address> =
        sqlx::query_as("SELECT * FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.user_id)
            .fetch_optional(&state.pool)
            .await?;

    match address {
        Some(address) => Ok(ApiResponse::success("Address", address, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let is_default = payload.is_default.unwrap_or(false);
    if is_default {
        unset_defaults(state, user, None).await?;
    }

    let address: Address = sqlx::query_as(
        r#"
        INSERT INTO addresses
            (id, user_id, label, address_line1, address_line2, city, state, zip_code, country, is_default)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.label.unwrap_or_else(|| "Home".to_string()))
    .bind(payload.address_line1)
    .bind(payload.address_line2)
    .bind(payload.city)
    .bind(payload.state)
    .bind(payload.zip_code)
    .bind(payload.country.unwrap_or_else(|| "India".to_string()))
    .bind(is_default)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Address created",
        address,
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    let existing: Option<Address> =
        sqlx::query_as("SELECT * FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user.user_id)
            .fetch_optional(&state.pool)
            .await?;
    let existing = match existing {
        Some(a) => a,
        None => return Err(AppError::NotFound),
    };

    let is_default = payload.is_default.unwrap_or(existing.is_default);
    if is_default && !existing.is_default {
        unset_defaults(state, user, Some(id)).await?;
    }

    let address: Address = sqlx::query_as(
        r#"
        UPDATE addresses
        SET label = $3, address_line1 = $4, address_line2 = $5, city = $6,
            state = $7, zip_code = $8, country = $9, is_default = $10, updated_at = now()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user.user_id)
    .bind(payload.label.unwrap_or(existing.label))
    .bind(payload.address_line1.unwrap_or(existing.address_line1))
    .bind(payload.address_line2.or(existing.address_line2))
    .bind(payload.city.unwrap_or(existing.city))
    .bind(payload.state.unwrap_or(existing.state))
    .bind(payload.zip_code.unwrap_or(existing.zip_code))
    .bind(payload.country.unwrap_or(existing.country))
    .bind(is_default)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Address updated",
        address,
        Some(Meta::empty()),
    ))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Address deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn set_default_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    unset_defaults(state, user, Some(id)).await?;

    let address: Option<Address> = sqlx::query_as(
        "UPDATE addresses SET is_default = TRUE, updated_at = now() WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?;

    match address {
        Some(address) => Ok(ApiResponse::success(
            "Default address set",
            address,
            Some(Meta::empty()),
        )),
        None => Err(AppError::NotFound),
    }
}

/// At most one default address per user.
async fn unset_defaults(state: &AppState, user: &AuthUser, except: Option<Uuid>) -> AppResult<()> {
    sqlx::query(
        "UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND ($2::uuid IS NULL OR id <> $2)",
    )
    .bind(user.user_id)
    .bind(except)
    .execute(&state.pool)
    .await?;
    Ok(())
}
