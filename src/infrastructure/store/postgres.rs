//! PostgreSQL 上的用户集合

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPool, FromRow};
use tracing::{debug, info};

use super::{next_timestamp, Sort, StoreError, UpdateOptions, UserFilter, UserStore};
use crate::{
    app::users::model::{User, UserFields, UserPatch},
    core::object_id::ObjectId,
};

const COLUMNS: &str = "id, name, email, age, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: String,
    name: String,
    email: String,
    age: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let id = ObjectId::parse(row.id.trim()).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        Ok(User {
            id,
            name: row.name,
            email: row.email,
            age: row.age,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_user(row: Option<UserRow>) -> Result<Option<User>, StoreError> {
    row.map(User::try_from).transpose()
}

fn map_write_error(err: sqlx::Error, email: &str) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::DuplicateEmail(email.to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_all(&self, sort: Sort) -> Result<Vec<User>, StoreError> {
        let order = match sort {
            Sort::CreatedAtAsc => "created_at ASC, id ASC",
            Sort::CreatedAtDesc => "created_at DESC, id DESC",
        };
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {COLUMNS} FROM users ORDER BY {order}"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), ?sort, "find_all");
        rows.into_iter().map(User::try_from).collect()
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {COLUMNS} FROM users WHERE id = $1"))
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await?;

        into_user(row)
    }

    async fn find_one(&self, filter: &UserFilter) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {COLUMNS} FROM users \
             WHERE ($1::TEXT IS NULL OR name = $1) AND ($2::TEXT IS NULL OR email = $2) \
             ORDER BY created_at ASC, id ASC LIMIT 1"
        ))
        .bind(filter.name.as_deref())
        .bind(filter.email.as_deref().map(str::to_lowercase))
        .fetch_optional(&self.pool)
        .await?;

        into_user(row)
    }

    async fn create(&self, fields: UserFields) -> Result<User, StoreError> {
        let fields = fields.into_valid(true)?;
        let now = next_timestamp(None);

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $5) RETURNING {COLUMNS}"
        ))
        .bind(ObjectId::new().to_hex())
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(fields.age)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &fields.email))?;

        let user = User::try_from(row)?;
        info!(id = %user.id, "user created");
        Ok(user)
    }

    async fn find_by_id_and_update(
        &self,
        id: &ObjectId,
        patch: UserPatch,
        options: UpdateOptions,
    ) -> Result<Option<User>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {COLUMNS} FROM users WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.to_hex())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(existing) = into_user(existing)? else {
            return Ok(None);
        };

        let fields = patch.apply_to(&existing).into_valid(options.validate)?;
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET name = $1, email = $2, age = $3, updated_at = $4 \
             WHERE id = $5 RETURNING {COLUMNS}"
        ))
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(fields.age)
        .bind(next_timestamp(Some(existing.updated_at)))
        .bind(id.to_hex())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &fields.email))?;

        tx.commit().await?;
        info!(%id, "user updated");

        if options.return_updated {
            User::try_from(row).map(Some)
        } else {
            Ok(Some(existing))
        }
    }

    async fn find_by_id_and_delete(&self, id: &ObjectId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {COLUMNS}"
        ))
        .bind(id.to_hex())
        .fetch_optional(&self.pool)
        .await?;

        if row.is_some() {
            info!(%id, "user deleted");
        }
        into_user(row)
    }

    async fn delete_all(&self) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
