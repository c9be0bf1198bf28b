use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::dto::{LoginRequest, LoginResponse};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::verify_password;
use crate::auth::service::enrich_login_user;
use crate::errors::ApiError;
use crate::state::AppState;
use crate::users::repo::UserRecord;

pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[instrument(skip(state, payload))]
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = UserRecord::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::NotFound("User not found".into())
        })?;

    if !verify_password(&payload.password, &user.password)? {
        warn!(email = %payload.email, user_id = %user.user_id, "login invalid password");
        return Err(ApiError::Auth("Invalid credentials".into()));
    }

    // Non-admin logins are incomplete without the peer's mod_poc_id, so the
    // token is only signed once the full user block is assembled.
    let login_user = enrich_login_user(
        &user,
        state.locator.as_ref(),
        &state.http,
        &state.config.discovery.peer_service_name,
    )
    .await?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(&user.user_id, &user.full_name)?;

    let msg = if login_user.admin {
        "Login successful (admin)"
    } else {
        "Login successful"
    };

    info!(user_id = %user.user_id, admin = login_user.admin, "user logged in");
    Ok(Json(LoginResponse {
        msg: msg.into(),
        token,
        user: login_user,
    }))
}
