use axum::{Json, Router, extract::State, routing::get};

use crate::{
    error::AppResult,
    models::Banner,
    response::ApiResponse,
    services::banner_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_banners))
}

#[utoipa::path(
    get,
    path = "/api/banners",
    responses(
        (status = 200, description = "Active banners in carousel order", body = ApiResponse<Vec<Banner>>)
    ),
    tag = "Banners"
)]
pub async fn list_banners(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<Banner>>>> {
    let resp = banner_service::list_active_banners(&state).await?;
    Ok(Json(resp))
}
