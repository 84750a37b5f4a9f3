use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::postgres::PgPoolOptions;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::identity::models::DisplayName;
use crate::domain::identity::models::EmailAddress;
use crate::domain::identity::models::Identity;
use crate::domain::identity::models::IdentityId;
use crate::domain::identity::ports::IdentityRepository;
use crate::identity::errors::IdentityError;

const EMAIL_UNIQUE_INDEX: &str = "identities_email_lower_key";

pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to the database and apply pending migrations.
    ///
    /// # Errors
    /// * `DatabaseError` - Connection or migration failed
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, IdentityError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        Ok(Self::new(pool))
    }
}

#[derive(FromRow)]
struct IdentityRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<IdentityRow> for Identity {
    type Error = IdentityError;

    fn try_from(row: IdentityRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |e: &dyn std::fmt::Display| {
            IdentityError::DatabaseError(format!("Stored identity {} is invalid: {}", id, e))
        };

        Ok(Identity {
            id: IdentityId(id),
            name: DisplayName::new(row.name).map_err(|e| corrupt(&e))?,
            email: EmailAddress::new(row.email).map_err(|e| corrupt(&e))?,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn create(&self, identity: Identity) -> Result<Identity, IdentityError> {
        sqlx::query(
            r#"
            INSERT INTO identities (id, name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(identity.id.0)
        .bind(identity.name.as_str())
        .bind(identity.email.as_str())
        .bind(&identity.password_hash)
        .bind(identity.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() && db_err.constraint() == Some(EMAIL_UNIQUE_INDEX)
                {
                    return IdentityError::EmailAlreadyExists(identity.email.as_str().to_string());
                }
            }
            IdentityError::DatabaseError(e.to_string())
        })?;

        Ok(identity)
    }

    async fn find_by_id(&self, id: &IdentityId) -> Result<Option<Identity>, IdentityError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM identities
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        row.map(Identity::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, IdentityError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM identities
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        row.map(Identity::try_from).transpose()
    }

    async fn delete(&self, id: &IdentityId) -> Result<(), IdentityError> {
        let result = sqlx::query(
            r#"
            DELETE FROM identities
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .execute(&self.pool)
        .await
        .map_err(|e| IdentityError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
