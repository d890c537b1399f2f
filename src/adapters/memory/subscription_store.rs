//! In-memory subscription store for tests and local runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::subscription::SubscriptionRecord;
use crate::ports::{user_not_found, SubscriptionStore};

#[derive(Debug, Clone)]
struct UserRow {
    email: String,
    subscription: SubscriptionRecord,
}

/// Map of users keyed by id, with write counting and failure injection.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    users: Mutex<HashMap<String, UserRow>>,
    updates: AtomicUsize,
    fail_updates: AtomicBool,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a user.
    pub fn insert_user(&self, user_id: &UserId, email: &str, subscription: SubscriptionRecord) {
        self.users().insert(
            user_id.as_str().to_string(),
            UserRow {
                email: email.to_string(),
                subscription,
            },
        );
    }

    // === Test Helpers ===

    pub fn record(&self, user_id: &UserId) -> Option<SubscriptionRecord> {
        self.users()
            .get(user_id.as_str())
            .map(|row| row.subscription.clone())
    }

    /// Successful `update_subscription` calls so far.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Makes every following update fail with a database error.
    pub fn set_fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    fn users(&self) -> MutexGuard<'_, HashMap<String, UserRow>> {
        self.users.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn find_by_user_id(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        Ok(self.record(user_id))
    }

    async fn update_subscription(
        &self,
        user_id: &UserId,
        record: &SubscriptionRecord,
    ) -> Result<(), DomainError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(DomainError::database("Simulated update failure"));
        }
        let mut users = self.users();
        let row = users
            .get_mut(user_id.as_str())
            .ok_or_else(|| user_not_found(user_id))?;
        row.subscription = record.clone();
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_email(&self, user_id: &UserId) -> Result<Option<String>, DomainError> {
        Ok(self.users().get(user_id.as_str()).map(|row| row.email.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ErrorCode, Timestamp};

    #[tokio::test]
    async fn update_replaces_record() {
        let store = InMemorySubscriptionStore::new();
        let u1 = UserId::new("u1").unwrap();
        store.insert_user(&u1, "u1@example.com", SubscriptionRecord::inactive(Timestamp::now()));
        let next = SubscriptionRecord::free_active(Timestamp::now());

        store.update_subscription(&u1, &next).await.unwrap();

        assert_eq!(store.get(&u1).await.unwrap(), next);
        assert_eq!(store.update_count(), 1);
    }

    #[tokio::test]
    async fn update_of_missing_user_is_not_found() {
        let store = InMemorySubscriptionStore::new();
        let err = store
            .update_subscription(
                &UserId::new("ghost").unwrap(),
                &SubscriptionRecord::inactive(Timestamp::now()),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::UserNotFound);
    }

    #[tokio::test]
    async fn injected_failure_is_database_error() {
        let store = InMemorySubscriptionStore::new();
        let u1 = UserId::new("u1").unwrap();
        store.insert_user(&u1, "u1@example.com", SubscriptionRecord::inactive(Timestamp::now()));
        store.set_fail_updates(true);

        let err = store
            .update_subscription(&u1, &SubscriptionRecord::free_active(Timestamp::now()))
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert_eq!(store.update_count(), 0);
    }

    #[tokio::test]
    async fn find_email_for_known_user() {
        let store = InMemorySubscriptionStore::new();
        let u1 = UserId::new("u1").unwrap();
        store.insert_user(&u1, "u1@example.com", SubscriptionRecord::inactive(Timestamp::now()));

        assert_eq!(store.find_email(&u1).await.unwrap().as_deref(), Some("u1@example.com"));
        assert_eq!(store.find_email(&UserId::new("u2").unwrap()).await.unwrap(), None);
    }
}
