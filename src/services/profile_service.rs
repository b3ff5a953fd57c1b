use chrono::Utc;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use crate::{
    dto::profile::UpdateProfileRequest,
    entity::profiles::{ActiveModel as ProfileActive, Entity as Profiles, Model as ProfileModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Profile>> {
    let profile = Profiles::find_by_id(user.user_id).one(&state.orm).await?;
    match profile {
        Some(profile) => Ok(ApiResponse::success(
            "Profile",
            profile_from_entity(profile),
            None,
        )),
        None => Err(AppError::NotFound),
    }
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<Profile>> {
    let existing = Profiles::find_by_id(user.user_id).one(&state.orm).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let mut active: ProfileActive = existing.into();
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(Some(full_name));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(avatar_url) = payload.avatar_url {
        active.avatar_url = Set(Some(avatar_url));
    }
    active.updated_at = Set(Utc::now().into());

    let profile = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Profile updated",
        profile_from_entity(profile),
        Some(Meta::empty()),
    ))
}

fn profile_from_entity(model: ProfileModel) -> Profile {
    Profile {
        user_id: model.user_id,
        full_name: model.full_name,
        phone: model.phone,
        avatar_url: model.avatar_url,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
