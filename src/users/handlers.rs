use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::auth::password::hash_password;
use crate::errors::ApiError;
use crate::state::AppState;
use crate::users::dto::{
    BulkOutcome, CreatedUser, LastLoginRequest, MsgWithUser, NewUserInput, RollnoBulkRequest,
    RollnoLookup, StatusRequest, StatusResponse, StatusUser, UpdateUserRequest, UserIdResponse,
    UserIdsResponse,
};
use crate::users::provisioning::{bulk_create, create_user};
use crate::users::repo::{UserChanges, UserRecord};

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/add_user", post(add_user))
        .route("/bulk_add_users", post(bulk_add_users))
        .route("/update_user/:user_id", put(update_user))
        .route("/update_last_login/:user_id", put(update_last_login))
        .route("/update_user_status/:user_id", put(update_user_status))
        .route("/delete_user/:user_id", delete(delete_user))
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/read_all_users", get(read_all_users))
        .route("/get_user_by_id/:user_id", get(get_user_by_id))
        .route("/user-ids", get(user_ids))
        .route("/get_user_id_by_rollno/:rollno", get(get_user_id_by_rollno))
        .route("/users/bulk", post(users_bulk))
}

#[instrument(skip(state, payload))]
async fn add_user(
    State(state): State<AppState>,
    Json(payload): Json<NewUserInput>,
) -> Result<(StatusCode, Json<CreatedUser>), ApiError> {
    let created = create_user(&state.db, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, payload))]
async fn bulk_add_users(
    State(state): State<AppState>,
    Json(payload): Json<Vec<NewUserInput>>,
) -> Result<Json<BulkOutcome>, ApiError> {
    if payload.is_empty() {
        return Err(ApiError::Validation(
            "Users array is required and cannot be empty".into(),
        ));
    }
    let outcome = bulk_create(&state.db, payload).await;
    info!(
        successes = outcome.successes.len(),
        failures = outcome.failures.len(),
        "bulk user creation completed"
    );
    Ok(Json(outcome))
}

#[instrument(skip(state))]
async fn read_all_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = UserRecord::list_all(&state.db).await?;
    Ok(Json(users))
}

#[instrument(skip(state))]
async fn get_user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserRecord>, ApiError> {
    let user = UserRecord::find_by_user_id(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserRecord>, ApiError> {
    if UserRecord::find_by_user_id(&state.db, &user_id)
        .await?
        .is_none()
    {
        return Err(ApiError::NotFound("User not found".into()));
    }

    // Any supplied password is rehashed before it touches the store.
    let password = match payload.password.filter(|p| !p.is_empty()) {
        Some(plain) => Some(hash_password(&plain)?),
        None => None,
    };

    let changes = UserChanges {
        full_name: payload.full_name,
        email: payload.email,
        password,
        department: payload.department,
        college: payload.college,
        rollno: payload.rollno,
        mobile_no: payload.mobile_no,
        status: payload.status,
        admin: payload.admin,
    };

    let updated = UserRecord::update_by_user_id(&state.db, &user_id, &changes)
        .await
        .map_err(|e| {
            if crate::users::repo::is_unique_violation(&e) {
                ApiError::Conflict("Email or Roll Number already exists".into())
            } else {
                ApiError::Internal(e.into())
            }
        })?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(%user_id, "user updated");
    Ok(Json(updated))
}

#[instrument(skip(state, payload))]
async fn update_last_login(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<LastLoginRequest>,
) -> Result<Json<MsgWithUser>, ApiError> {
    let at = payload
        .user_last_login
        .ok_or_else(|| ApiError::Validation("Last login timestamp is required".into()))?;

    let user = UserRecord::set_last_login(&state.db, &user_id, at)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(MsgWithUser {
        msg: "Last login updated successfully".into(),
        user,
    }))
}

#[instrument(skip(state))]
async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<MsgWithUser>, ApiError> {
    let user = UserRecord::delete_by_user_id(&state.db, &user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    info!(%user_id, "user deleted");
    Ok(Json(MsgWithUser {
        msg: "User deleted successfully".into(),
        user,
    }))
}

#[instrument(skip(state, payload))]
async fn update_user_status(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<StatusRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let user = UserRecord::set_status(&state.db, &user_id, payload.status)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let label = if user.status { "active" } else { "inactive" };
    Ok(Json(StatusResponse {
        msg: format!("User status updated successfully to {label}"),
        user: StatusUser {
            user_id: user.user_id,
            full_name: user.full_name,
            status: user.status,
        },
    }))
}

#[instrument(skip(state))]
async fn user_ids(State(state): State<AppState>) -> Result<Json<UserIdsResponse>, ApiError> {
    let user_ids = UserRecord::list_user_ids(&state.db).await?;
    Ok(Json(UserIdsResponse { user_ids }))
}

#[instrument(skip(state))]
async fn get_user_id_by_rollno(
    State(state): State<AppState>,
    Path(rollno): Path<String>,
) -> Result<Json<UserIdResponse>, ApiError> {
    let user = UserRecord::find_by_rollno(&state.db, &rollno)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(UserIdResponse {
        user_id: user.user_id,
    }))
}

#[instrument(skip(state, payload))]
async fn users_bulk(
    State(state): State<AppState>,
    Json(payload): Json<RollnoBulkRequest>,
) -> Result<Json<Vec<RollnoLookup>>, ApiError> {
    if payload.rollnos.is_empty() {
        warn!("bulk rollno lookup with empty input");
        return Err(ApiError::Validation(
            "Roll numbers must be provided as a non-empty array".into(),
        ));
    }

    let found = UserRecord::find_many_by_rollno_list(&state.db, &payload.rollnos).await?;
    Ok(Json(map_rollnos(payload.rollnos, found)))
}

/// Join requested roll numbers against the resolved pairs, preserving input
/// order and emitting a null `user_id` for unmatched entries.
fn map_rollnos(rollnos: Vec<String>, found: Vec<(String, String)>) -> Vec<RollnoLookup> {
    rollnos
        .into_iter()
        .map(|rollno| {
            let user_id = found
                .iter()
                .find(|(r, _)| *r == rollno)
                .map(|(_, id)| id.clone());
            RollnoLookup { rollno, user_id }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollno_mapping_preserves_order_and_marks_missing() {
        let found = vec![("A".to_string(), "id-a".to_string())];
        let out = map_rollnos(vec!["A".into(), "B".into()], found);
        assert_eq!(
            out,
            vec![
                RollnoLookup {
                    rollno: "A".into(),
                    user_id: Some("id-a".into())
                },
                RollnoLookup {
                    rollno: "B".into(),
                    user_id: None
                },
            ]
        );
    }

    #[test]
    fn rollno_mapping_ignores_resolution_order() {
        let found = vec![
            ("B".to_string(), "id-b".to_string()),
            ("A".to_string(), "id-a".to_string()),
        ];
        let out = map_rollnos(vec!["A".into(), "B".into()], found);
        assert_eq!(out[0].user_id.as_deref(), Some("id-a"));
        assert_eq!(out[1].user_id.as_deref(), Some("id-b"));
    }
}
