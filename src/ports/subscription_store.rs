//! SubscriptionStore port - Per-user subscription mirror.
//!
//! The subscription record lives on the user entity. Writes replace the
//! whole sub-record in a single atomic per-user statement; concurrent writers
//! on the same user resolve last-writer-wins.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::domain::subscription::SubscriptionRecord;

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Returns the record, or `None` if the user does not exist.
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Returns the record or fails with `UserNotFound`.
    async fn get(&self, user_id: &UserId) -> Result<SubscriptionRecord, DomainError> {
        self.find_by_user_id(user_id)
            .await?
            .ok_or_else(|| user_not_found(user_id))
    }

    /// Replaces the user's subscription sub-record.
    ///
    /// Fails with `UserNotFound` if the user does not exist.
    async fn update_subscription(
        &self,
        user_id: &UserId,
        record: &SubscriptionRecord,
    ) -> Result<(), DomainError>;

    /// Contact email used to prefill checkout. `None` if the user does not exist.
    async fn find_email(&self, user_id: &UserId) -> Result<Option<String>, DomainError>;
}

/// `UserNotFound` error carrying the id as a detail.
pub fn user_not_found(user_id: &UserId) -> DomainError {
    DomainError::new(ErrorCode::UserNotFound, format!("User {} not found", user_id))
        .with_detail("user_id", user_id.as_str())
}
