use crate::{
    error::AppResult,
    models::Banner,
    response::ApiResponse,
    state::AppState,
};

/// Active banners in carousel order.
pub async fn list_active_banners(state: &AppState) -> AppResult<ApiResponse<Vec<Banner>>> {
    let banners: Vec<Banner> = sqlx::query_as(
        "SELECT * FROM banners WHERE is_active ORDER BY sort_order, created_at DESC",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success("Banners", banners, None))
}
