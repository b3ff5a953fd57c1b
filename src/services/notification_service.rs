use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::notifications::{
        NotificationList, SendNotificationRequest, SendNotificationResponse, UnreadCount,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Notification,
    response::{ApiResponse, Meta},
    routes::params::NotificationQuery,
    state::AppState,
};

/// Appends one notification row. This is the only write path into the log;
/// later mutations are limited to read-flag toggles and owner deletes.
pub async fn create(
    state: &AppState,
    user_id: Uuid,
    kind: &str,
    title: &str,
    message: &str,
    metadata: Option<Value>,
) -> AppResult<Notification> {
    let notification: Notification = sqlx::query_as(
        r#"
        INSERT INTO notifications (id, user_id, type, title, message, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(kind)
    .bind(title)
    .bind(message)
    .bind(metadata)
    .fetch_one(&state.pool)
    .await?;

    Ok(notification)
}

pub async fn list(
    state: &AppState,
    user: &AuthUser,
    query: NotificationQuery,
) -> AppResult<ApiResponse<NotificationList>> {
    let (page, limit, offset) = query.pagination.normalize();

    let rows: Vec<Notification> = sqlx::query_as(
        r#"
        SELECT * FROM notifications
        WHERE user_id = $1
          AND ($2::text IS NULL OR type = $2)
          AND ($3::boolean IS NULL OR read = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(user.user_id)
    .bind(query.kind.as_deref())
    .bind(query.read)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM notifications
        WHERE user_id = $1
          AND ($2::text IS NULL OR type = $2)
          AND ($3::boolean IS NULL OR read = $3)
        "#,
    )
    .bind(user.user_id)
    .bind(query.kind.as_deref())
    .bind(query.read)
    .fetch_one(&state.pool)
    .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Notifications",
        NotificationList { items: rows },
        Some(meta),
    ))
}

pub async fn unread_count(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<UnreadCount>> {
    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT read")
            .bind(user.user_id)
            .fetch_one(&state.pool)
            .await?;

    Ok(ApiResponse::success(
        "OK",
        UnreadCount { count: total.0 },
        None,
    ))
}

pub async fn mark_read(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Notification>> {
    let notification: Option<Notification> = sqlx::query_as(
        "UPDATE notifications SET read = TRUE WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(id)
    .bind(user.user_id)
    .fetch_optional(&state.pool)
    .await?;

    match notification {
        Some(notification) => Ok(ApiResponse::success("Marked as read", notification, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn mark_all_read(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("UPDATE notifications SET read = TRUE WHERE user_id = $1 AND NOT read")
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "Marked all as read",
        serde_json::json!({ "updated": result.rows_affected() }),
        Some(Meta::empty()),
    ))
}

pub async fn delete(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Appends the row, then optionally fans out to the email/SMS channels.
/// Fan-out is advisory: a channel failure is logged and reported through the
/// sent flags without failing the call or touching the stored row.
pub async fn send(
    state: &AppState,
    caller: &AuthUser,
    payload: SendNotificationRequest,
) -> AppResult<ApiResponse<SendNotificationResponse>> {
    ensure_admin(caller)?;

    let notification = create(
        state,
        payload.user_id,
        &payload.kind,
        &payload.title,
        &payload.message,
        payload.metadata,
    )
    .await?;

    let mut email_sent = false;
    let mut sms_sent = false;

    if payload.send_email || payload.send_sms {
        let contact: Option<(String, Option<String>)> = sqlx::query_as(
            r#"
            SELECT u.email, p.phone
            FROM users u
            LEFT JOIN profiles p ON p.user_id = u.id
            WHERE u.id = $1
            "#,
        )
        .bind(payload.user_id)
        .fetch_optional(&state.pool)
        .await?;

        if let Some((email, phone)) = contact {
            if payload.send_email {
                email_sent = deliver_email(&email, &payload.title, &payload.message);
            }
            if payload.send_sms {
                if let Some(phone) = phone {
                    sms_sent = deliver_sms(&phone, &payload.title, &payload.message);
                }
            }
        }
    }

    Ok(ApiResponse::success(
        "Notification sent",
        SendNotificationResponse {
            notification,
            email_sent,
            sms_sent,
        },
        Some(Meta::empty()),
    ))
}

// Delivery stubs: a real deployment would hand these to an email/SMS
// provider. They only log the would-be message.
fn deliver_email(email: &str, subject: &str, body: &str) -> bool {
    tracing::info!(to = %email, %subject, %body, "email notification (stub)");
    true
}

fn deliver_sms(phone: &str, title: &str, message: &str) -> bool {
    tracing::info!(to = %phone, text = %format!("{title}: {message}"), "sms notification (stub)");
    true
}
