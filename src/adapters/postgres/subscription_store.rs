//! PostgreSQL implementation of SubscriptionStore.
//!
//! Subscription state lives in `subscription_*` columns on the `users` table,
//! next to the email used for checkout.

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::subscription::{SubscriptionPlan, SubscriptionRecord, SubscriptionStatus};
use crate::ports::{user_not_found, SubscriptionStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    subscription_plan: String,
    subscription_status: String,
    subscription_current_period_end: Option<DateTime<Utc>>,
    subscription_provider: Option<String>,
    subscription_provider_ref: Option<String>,
    subscription_updated_at: DateTime<Utc>,
    subscription_last_event_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(SubscriptionRecord {
            plan: parse_plan(&row.subscription_plan)?,
            status: parse_status(&row.subscription_status)?,
            current_period_end: row
                .subscription_current_period_end
                .map(Timestamp::from_datetime),
            provider: row.subscription_provider,
            provider_ref: row.subscription_provider_ref,
            updated_at: Timestamp::from_datetime(row.subscription_updated_at),
            last_event_at: row.subscription_last_event_at.map(Timestamp::from_datetime),
        })
    }
}

fn parse_plan(s: &str) -> Result<SubscriptionPlan, DomainError> {
    s.parse().map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid plan value: {}", s),
        )
    })
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    s.parse().map_err(|_| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )
    })
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(
            r#"
            SELECT subscription_plan, subscription_status, subscription_current_period_end,
                   subscription_provider, subscription_provider_ref, subscription_updated_at,
                   subscription_last_event_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find user: {}", e))
        })?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn update_subscription(
        &self,
        user_id: &UserId,
        record: &SubscriptionRecord,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                subscription_plan = $2,
                subscription_status = $3,
                subscription_current_period_end = $4,
                subscription_provider = $5,
                subscription_provider_ref = $6,
                subscription_updated_at = $7,
                subscription_last_event_at = $8
            WHERE id = $1
            "#,
        )
        .bind(user_id.as_str())
        .bind(record.plan.as_str())
        .bind(record.status.as_str())
        .bind(record.current_period_end.map(|t| *t.as_datetime()))
        .bind(&record.provider)
        .bind(&record.provider_ref)
        .bind(record.updated_at.as_datetime())
        .bind(record.last_event_at.map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to update subscription: {}", e),
            )
        })?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(user_id));
        }

        Ok(())
    }

    async fn find_email(&self, user_id: &UserId) -> Result<Option<String>, DomainError> {
        let email: Option<Option<String>> =
            sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(ErrorCode::DatabaseError, format!("Failed to find user: {}", e))
                })?;

        Ok(email.flatten().filter(|e| !e.trim().is_empty()))
    }
}
