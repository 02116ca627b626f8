use anyhow::Context;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{Gender, Lookup, NewUserRecord, ProfileChanges, UserRecord};
use super::store::{StoreError, UserStore};

const USER_COLUMNS: &str =
    "id, username, email, fullname, password_hash, gender, dob, country, created_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    fullname: String,
    password_hash: String,
    gender: String,
    dob: Date,
    country: String,
    created_at: OffsetDateTime,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = StoreError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let gender = Gender::parse(&r.gender)
            .with_context(|| format!("unknown gender {:?} on user {}", r.gender, r.id))?;
        Ok(Self {
            id: r.id,
            username: r.username,
            email: r.email,
            fullname: r.fullname,
            password_hash: r.password_hash,
            gender,
            dob: r.dob,
            country: r.country,
            created_at: r.created_at,
        })
    }
}

fn into_record(row: Option<UserRow>) -> Result<Option<UserRecord>, StoreError> {
    row.map(UserRecord::try_from).transpose()
}

/// Postgres-backed store. Uniqueness is enforced by the `users` table's
/// UNIQUE constraints.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_one(&self, lookup: &Lookup) -> Result<Option<UserRecord>, StoreError> {
        if lookup.is_empty() {
            return Ok(None);
        }
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE ($1::text IS NOT NULL AND username = $1)
               OR ($2::text IS NOT NULL AND email = $2)
            ORDER BY created_at ASC
            LIMIT 1
            "#
        ))
        .bind(lookup.username.as_deref())
        .bind(lookup.email.as_deref())
        .fetch_optional(&self.db)
        .await?;
        into_record(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        into_record(row)
    }

    async fn insert(&self, user: NewUserRecord) -> Result<UserRecord, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, username, email, fullname, password_hash, gender, dob, country)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.fullname)
        .bind(&user.password_hash)
        .bind(user.gender.as_str())
        .bind(user.dob)
        .bind(&user.country)
        .fetch_one(&self.db)
        .await?;
        UserRecord::try_from(row)
    }

    async fn update_fields(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            UPDATE users
               SET fullname = COALESCE($2, fullname),
                   email = COALESCE($3, email)
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.fullname.as_deref())
        .bind(changes.email.as_deref())
        .fetch_optional(&self.db)
        .await?;
        into_record(row)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> Result<bool, StoreError> {
        let res = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() == 1)
    }
}
