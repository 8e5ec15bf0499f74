// src/repositories/postgres/payment_code.rs

use byteclinic_common::models::PaymentCode;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::Error;

#[async_trait::async_trait]
pub trait PaymentCodeRepo {
    /// Insert a new code row. A unique-constraint violation on `code`
    /// surfaces as `Error::DuplicateCode` so issuance can retry with a
    /// fresh candidate instead of reporting a spurious conflict.
    async fn create(&self, code: &PaymentCode) -> Result<(), Error>;
    /// Exact-match lookup; the caller is responsible for normalizing.
    async fn get_by_code(&self, code: &str) -> Result<Option<PaymentCode>, Error>;
    /// Monotonic false -> true; repeating the call is a no-op.
    async fn mark_used(&self, code: &str) -> Result<(), Error>;
    async fn delete(&self, payment_code_id: Uuid) -> Result<(), Error>;
    async fn list_all(&self) -> Result<Vec<PaymentCode>, Error>;
}

pub struct PostgresPaymentCodeRepository {
    pub pool: Pool<Postgres>,
}

impl PostgresPaymentCodeRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PaymentCodeRepo for PostgresPaymentCodeRepository {
    async fn create(&self, code: &PaymentCode) -> Result<(), Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO payment_codes (
                payment_code_id, code, price, description, stripe_price_id, used, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(code.payment_code_id)
        .bind(&code.code)
        .bind(code.price)
        .bind(&code.description)
        .bind(&code.stripe_price_id)
        .bind(code.used)
        .bind(code.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(Error::DuplicateCode(code.code.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<PaymentCode>, Error> {
        let row = sqlx::query_as::<_, PaymentCode>(
            r#"
            SELECT payment_code_id,
                   code,
                   price,
                   description,
                   stripe_price_id,
                   used,
                   created_at
            FROM payment_codes
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn mark_used(&self, code: &str) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE payment_codes
            SET used = TRUE
            WHERE code = $1
            "#,
        )
        .bind(code)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete(&self, payment_code_id: Uuid) -> Result<(), Error> {
        sqlx::query("DELETE FROM payment_codes WHERE payment_code_id = $1")
            .bind(payment_code_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<PaymentCode>, Error> {
        let rows = sqlx::query_as::<_, PaymentCode>(
            r#"
            SELECT payment_code_id,
                   code,
                   price,
                   description,
                   stripe_price_id,
                   used,
                   created_at
            FROM payment_codes
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
