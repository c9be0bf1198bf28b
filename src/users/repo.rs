use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record as stored. `id` is the storage-internal key; `user_id` is the
/// opaque public reference and the only identifier the API exposes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRecord {
    #[serde(skip_serializing)]
    pub id: Uuid,
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub department: String,
    pub college: String,
    pub rollno: Option<String>,
    pub mobile_no: Option<String>,
    pub status: bool,
    pub admin: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub user_last_login: Option<OffsetDateTime>,
}

/// Field values for an insert. `password` already holds the hash; `user_id`
/// is generated by the caller at construction time.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    pub user_id: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub department: String,
    pub college: String,
    pub rollno: Option<String>,
    pub mobile_no: Option<String>,
    pub status: bool,
    pub admin: bool,
}

/// Partial update; absent fields are left untouched. `user_id` is immutable
/// and never part of the set list.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub department: Option<String>,
    pub college: Option<String>,
    pub rollno: Option<String>,
    pub mobile_no: Option<String>,
    pub status: Option<bool>,
    pub admin: Option<bool>,
}

/// Postgres unique-violation, the authoritative duplicate guard behind the
/// pre-insert lookup.
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

const ALL_COLUMNS: &str = "id, user_id, full_name, email, password, department, college, \
                           rollno, mobile_no, status, admin, user_last_login";

impl UserRecord {
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {ALL_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Disjunctive duplicate check used before provisioning: matches the
    /// email, or the rollno when one was supplied.
    pub async fn find_by_email_or_rollno(
        db: &PgPool,
        email: &str,
        rollno: Option<&str>,
    ) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {ALL_COLUMNS} FROM users \
             WHERE email = $1 OR ($2::text IS NOT NULL AND rollno = $2) \
             LIMIT 1"
        ))
        .bind(email)
        .bind(rollno)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_user_id(db: &PgPool, user_id: &str) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {ALL_COLUMNS} FROM users WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_rollno(db: &PgPool, rollno: &str) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {ALL_COLUMNS} FROM users WHERE rollno = $1"
        ))
        .bind(rollno)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Resolve many roll numbers at once; unmatched ones simply yield no row.
    pub async fn find_many_by_rollno_list(
        db: &PgPool,
        rollnos: &[String],
    ) -> anyhow::Result<Vec<(String, String)>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT rollno, user_id FROM users WHERE rollno = ANY($1)",
        )
        .bind(rollnos)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn insert(db: &PgPool, new: &NewUserRecord) -> Result<UserRecord, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users \
             (user_id, full_name, email, password, department, college, rollno, mobile_no, status, admin) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ALL_COLUMNS}"
        ))
        .bind(&new.user_id)
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.password)
        .bind(&new.department)
        .bind(&new.college)
        .bind(&new.rollno)
        .bind(&new.mobile_no)
        .bind(new.status)
        .bind(new.admin)
        .fetch_one(db)
        .await
    }

    pub async fn update_by_user_id(
        db: &PgPool,
        user_id: &str,
        changes: &UserChanges,
    ) -> Result<Option<UserRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET \
                full_name = COALESCE($2, full_name), \
                email = COALESCE($3, email), \
                password = COALESCE($4, password), \
                department = COALESCE($5, department), \
                college = COALESCE($6, college), \
                rollno = COALESCE($7, rollno), \
                mobile_no = COALESCE($8, mobile_no), \
                status = COALESCE($9, status), \
                admin = COALESCE($10, admin) \
             WHERE user_id = $1 \
             RETURNING {ALL_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&changes.full_name)
        .bind(&changes.email)
        .bind(&changes.password)
        .bind(&changes.department)
        .bind(&changes.college)
        .bind(&changes.rollno)
        .bind(&changes.mobile_no)
        .bind(changes.status)
        .bind(changes.admin)
        .fetch_optional(db)
        .await
    }

    pub async fn set_last_login(
        db: &PgPool,
        user_id: &str,
        at: OffsetDateTime,
    ) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET user_last_login = $2 WHERE user_id = $1 RETURNING {ALL_COLUMNS}"
        ))
        .bind(user_id)
        .bind(at)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn set_status(
        db: &PgPool,
        user_id: &str,
        status: bool,
    ) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET status = $2 WHERE user_id = $1 RETURNING {ALL_COLUMNS}"
        ))
        .bind(user_id)
        .bind(status)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn delete_by_user_id(
        db: &PgPool,
        user_id: &str,
    ) -> anyhow::Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(&format!(
            "DELETE FROM users WHERE user_id = $1 RETURNING {ALL_COLUMNS}"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn list_all(db: &PgPool) -> anyhow::Result<Vec<UserRecord>> {
        let users =
            sqlx::query_as::<_, UserRecord>(&format!("SELECT {ALL_COLUMNS} FROM users"))
                .fetch_all(db)
                .await?;
        Ok(users)
    }

    pub async fn list_user_ids(db: &PgPool) -> anyhow::Result<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT user_id FROM users")
            .fetch_all(db)
            .await?;
        Ok(ids)
    }
}
