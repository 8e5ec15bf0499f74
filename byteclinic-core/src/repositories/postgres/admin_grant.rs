// src/repositories/postgres/admin_grant.rs

use byteclinic_common::models::AdminGrant;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::Error;

#[async_trait::async_trait]
pub trait AdminGrantRepo {
    /// Insert-if-absent. Concurrent promotions of the same user both
    /// succeed; only one row ever exists per user.
    async fn create(&self, grant: &AdminGrant) -> Result<(), Error>;
    async fn get(&self, user_id: Uuid) -> Result<Option<AdminGrant>, Error>;
    async fn delete(&self, user_id: Uuid) -> Result<(), Error>;
    async fn list_all(&self) -> Result<Vec<AdminGrant>, Error>;
}

pub struct PostgresAdminGrantRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresAdminGrantRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AdminGrantRepo for PostgresAdminGrantRepository {
    async fn create(&self, grant: &AdminGrant) -> Result<(), Error> {
        sqlx::query(
            r#"
            INSERT INTO admin_grants (user_id, granted_by, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(grant.user_id)
        .bind(grant.granted_by)
        .bind(grant.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get(&self, user_id: Uuid) -> Result<Option<AdminGrant>, Error> {
        let row = sqlx::query_as::<_, AdminGrant>(
            r#"
            SELECT user_id, granted_by, created_at
            FROM admin_grants
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn delete(&self, user_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM admin_grants WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AdminGrant>, Error> {
        let rows = sqlx::query_as::<_, AdminGrant>(
            r#"
            SELECT user_id, granted_by, created_at
            FROM admin_grants
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
