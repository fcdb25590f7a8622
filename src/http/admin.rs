//! Admin endpoints forwarded to the Supabase admin API

use axum::{
    extract::{rejection::JsonRejection, Extension, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::http::middleware::AuthenticatedUser;
use crate::http::AppError;
use crate::store::supabase::SupabaseError;

/// Supabase's default minimum password length
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct CreateUserResponse {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Loose shape check; Supabase does the real validation
pub fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

/// POST /api/admin/create-user
pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateUserResponse>), AppError> {
    let caller = auth.email.as_deref().unwrap_or_default();
    if !state.config.is_admin(caller) {
        warn!(user_id = %auth.user_id, "Non-admin attempted user creation");
        return Err(AppError::Forbidden("Admin access required".to_string()));
    }

    let Json(req) = payload?;
    let email = req.email.trim();

    if !is_plausible_email(email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let user = state
        .supabase
        .create_auth_user(email, &req.password)
        .await
        .map_err(|e| {
            // 422 means the address is already registered or rejected
            let rejected =
                matches!(&e, SupabaseError::Api { status, .. } if *status == 400 || *status == 422);
            if rejected {
                AppError::BadRequest(
                    e.api_message()
                        .unwrap_or_else(|| "User could not be created".to_string()),
                )
            } else {
                AppError::from(e)
            }
        })?;

    info!(admin = %auth.user_id, new_user = %user.id, "Created user");

    Ok((
        StatusCode::CREATED,
        Json(CreateUserResponse {
            id: user.id,
            email: user.email,
        }),
    ))
}
