use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{derive_default_password, hash_password};
use crate::errors::ApiError;
use crate::users::dto::{BulkFailure, BulkOutcome, CreatedUser, NewUserInput};
use crate::users::repo::{is_unique_violation, NewUserRecord, UserRecord};

/// Empty and whitespace-only strings count as absent, same as the upstream
/// API contract.
fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Required-field rules, checked in a fixed order so each rejection carries
/// its own reason. Admins must bring a password; non-admins must identify
/// their department, college and roll number, and need a mobile number when
/// the password is to be derived from it.
pub fn validate_new_user(input: &NewUserInput) -> Result<(), ApiError> {
    if !present(&input.full_name) || !present(&input.email) {
        return Err(ApiError::Validation(
            "Full name and email are required".into(),
        ));
    }

    if input.admin.unwrap_or(false) {
        if !present(&input.password) {
            return Err(ApiError::Validation(
                "Password is required for admin users".into(),
            ));
        }
    } else {
        if !present(&input.department) || !present(&input.college) || !present(&input.rollno) {
            return Err(ApiError::Validation(
                "Department, college, and roll number are required for non-admin users".into(),
            ));
        }
        if !present(&input.password) && !present(&input.mobile_no) {
            return Err(ApiError::Validation(
                "Mobile number is required for non-admin users when password is empty".into(),
            ));
        }
    }

    Ok(())
}

/// Supplied password verbatim, otherwise the deterministic fallback for
/// non-admin accounts. Only called on validated input, so admins always hit
/// the first arm.
pub fn resolve_password(input: &NewUserInput) -> String {
    match non_empty(input.password.clone()) {
        Some(plain) => plain,
        None => derive_default_password(
            input.full_name.as_deref().unwrap_or(""),
            input.mobile_no.as_deref().unwrap_or(""),
        ),
    }
}

/// Validate, enforce uniqueness, hash, and persist one user.
///
/// The pre-insert lookup gives a friendly error for the common case; the
/// store's unique indexes remain the authoritative guard against a race
/// between concurrent requests.
pub async fn create_user(db: &PgPool, input: NewUserInput) -> Result<CreatedUser, ApiError> {
    validate_new_user(&input)?;

    let email = input.email.clone().unwrap_or_default();
    let rollno = non_empty(input.rollno.clone());

    if UserRecord::find_by_email_or_rollno(db, &email, rollno.as_deref())
        .await?
        .is_some()
    {
        warn!(%email, "duplicate email or rollno");
        return Err(ApiError::Conflict("Email or Roll Number already exists".into()));
    }

    let plain_password = resolve_password(&input);
    let hash = hash_password(&plain_password)?;

    let new = NewUserRecord {
        user_id: Uuid::new_v4().to_string(),
        full_name: input.full_name.unwrap_or_default(),
        email,
        password: hash,
        department: input.department.unwrap_or_default(),
        college: input.college.unwrap_or_default(),
        rollno,
        mobile_no: non_empty(input.mobile_no),
        status: input.status.unwrap_or(true),
        admin: input.admin.unwrap_or(false),
    };

    let saved = UserRecord::insert(db, &new).await.map_err(|e| {
        if is_unique_violation(&e) {
            ApiError::Conflict("Email or Roll Number already exists".into())
        } else {
            ApiError::Internal(e.into())
        }
    })?;

    info!(user_id = %saved.user_id, email = %saved.email, "user created");
    Ok(CreatedUser {
        full_name: saved.full_name,
        email: saved.email,
        plain_password,
        department: saved.department,
        college: saved.college,
        rollno: saved.rollno,
    })
}

/// Provision a batch, strictly in input order. A failing item is recorded
/// and never aborts the rest; successes and failures each keep the relative
/// order of their inputs.
pub async fn bulk_create(db: &PgPool, items: Vec<NewUserInput>) -> BulkOutcome {
    let mut successes = Vec::new();
    let mut failures = Vec::new();

    for item in items {
        let email = non_empty(item.email.clone()).unwrap_or_else(|| "unknown".into());
        match create_user(db, item).await {
            Ok(created) => successes.push(created),
            Err(e) => failures.push(BulkFailure {
                email,
                msg: e.to_string(),
            }),
        }
    }

    BulkOutcome {
        msg: "Bulk user creation completed".into(),
        successes,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_non_admin() -> NewUserInput {
        NewUserInput {
            full_name: Some("Asha Rao".into()),
            email: Some("asha@example.edu".into()),
            password: None,
            department: Some("CSE".into()),
            college: Some("Main".into()),
            rollno: Some("21CS001".into()),
            mobile_no: Some("9876543210".into()),
            status: None,
            admin: None,
        }
    }

    #[test]
    fn accepts_complete_non_admin_input() {
        assert!(validate_new_user(&minimal_non_admin()).is_ok());
    }

    #[test]
    fn rejects_missing_identity_fields() {
        let mut input = minimal_non_admin();
        input.email = Some("   ".into());
        let err = validate_new_user(&input).unwrap_err();
        assert_eq!(err.to_string(), "Full name and email are required");
    }

    #[test]
    fn rejects_admin_without_password() {
        let mut input = minimal_non_admin();
        input.admin = Some(true);
        input.password = None;
        let err = validate_new_user(&input).unwrap_err();
        assert_eq!(err.to_string(), "Password is required for admin users");
    }

    #[test]
    fn admin_with_password_needs_no_campus_fields() {
        let input = NewUserInput {
            full_name: Some("Root".into()),
            email: Some("root@example.edu".into()),
            password: Some("hunter22".into()),
            department: None,
            college: None,
            rollno: None,
            mobile_no: None,
            status: None,
            admin: Some(true),
        };
        assert!(validate_new_user(&input).is_ok());
    }

    #[test]
    fn rejects_non_admin_missing_campus_fields() {
        let mut input = minimal_non_admin();
        input.rollno = None;
        let err = validate_new_user(&input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Department, college, and roll number are required for non-admin users"
        );
    }

    #[test]
    fn rejects_non_admin_without_password_or_mobile() {
        let mut input = minimal_non_admin();
        input.password = None;
        input.mobile_no = Some("".into());
        let err = validate_new_user(&input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Mobile number is required for non-admin users when password is empty"
        );
    }

    #[test]
    fn resolve_password_prefers_supplied_value() {
        let mut input = minimal_non_admin();
        input.password = Some("chosen-by-user".into());
        assert_eq!(resolve_password(&input), "chosen-by-user");
    }

    #[test]
    fn resolve_password_derives_for_non_admin() {
        let input = minimal_non_admin();
        assert_eq!(resolve_password(&input), "asha3210");
    }

    #[test]
    fn created_user_serializes_null_rollno() {
        let created = CreatedUser {
            full_name: "Root".into(),
            email: "root@example.edu".into(),
            plain_password: "hunter22".into(),
            department: String::new(),
            college: String::new(),
            rollno: None,
        };
        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["rollno"], serde_json::Value::Null);
        assert_eq!(json["plain_password"], "hunter22");
    }
}
