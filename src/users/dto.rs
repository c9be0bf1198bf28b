use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::users::repo::UserRecord;

/// Incoming shape for single and bulk provisioning. Every field beyond the
/// identity pair is optional at the schema level; which ones are actually
/// required depends on the admin flag and is enforced by validation.
#[derive(Debug, Clone, Deserialize)]
pub struct NewUserInput {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub rollno: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub admin: Option<bool>,
}

/// Creation response: echoes the plaintext actually used (supplied or
/// derived) exactly once; the stored hash is never returned.
#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub full_name: String,
    pub email: String,
    pub plain_password: String,
    pub department: String,
    pub college: String,
    pub rollno: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BulkFailure {
    pub email: String,
    pub msg: String,
}

#[derive(Debug, Serialize)]
pub struct BulkOutcome {
    pub msg: String,
    pub successes: Vec<CreatedUser>,
    pub failures: Vec<BulkFailure>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub rollno: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(default)]
    pub status: Option<bool>,
    #[serde(default)]
    pub admin: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LastLoginRequest {
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub user_last_login: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub msg: String,
    pub user: StatusUser,
}

#[derive(Debug, Serialize)]
pub struct StatusUser {
    pub user_id: String,
    pub full_name: String,
    pub status: bool,
}

#[derive(Debug, Serialize)]
pub struct MsgWithUser {
    pub msg: String,
    pub user: UserRecord,
}

#[derive(Debug, Serialize)]
pub struct UserIdsResponse {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct UserIdResponse {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RollnoBulkRequest {
    #[serde(default)]
    pub rollnos: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RollnoLookup {
    pub rollno: String,
    pub user_id: Option<String>,
}
