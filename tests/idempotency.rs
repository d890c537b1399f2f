//! Idempotency of gateway event ingestion under redelivery.
//!
//! Any delivery sequence, sequential or concurrent, ends with one ledger row
//! per event id, every row processed, and the record written once per id.

use std::sync::Arc;

use futures::future::join_all;
use proptest::prelude::*;
use serde_json::json;
use tokio::sync::Barrier;

use storynest_billing::adapters::{
    InMemoryEventLedger, InMemorySubscriptionStore, MockGatewayClient, RecordingCacheInvalidator,
};
use storynest_billing::application::{ProcessOutcome, SubscriptionService};
use storynest_billing::ports::EventLedger;
use storynest_billing::domain::foundation::{EventId, Timestamp, UserId};
use storynest_billing::domain::subscription::{
    SubscriptionPlan, SubscriptionRecord, SubscriptionStatus,
};

fn setup() -> (
    Arc<InMemoryEventLedger>,
    Arc<InMemorySubscriptionStore>,
    SubscriptionService,
) {
    let ledger = Arc::new(InMemoryEventLedger::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    store.insert_user(
        &UserId::new("u1").unwrap(),
        "u1@example.com",
        SubscriptionRecord::inactive(Timestamp::now()),
    );
    let service = SubscriptionService::new(
        ledger.clone(),
        store.clone(),
        Arc::new(MockGatewayClient::new()),
        Arc::new(RecordingCacheInvalidator::new()),
    );
    (ledger, store, service)
}

fn payload(n: u8) -> serde_json::Value {
    let plan = if n % 2 == 0 { "premium" } else { "family" };
    json!({
        "plan": plan,
        "status": "active",
        "provider": "gw",
        "providerRef": format!("r{}", n)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn redelivery_never_reapplies(deliveries in prop::collection::vec(0u8..5, 1..40)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let (ledger, store, service) = setup();
            let mut seen = std::collections::HashSet::new();

            for n in &deliveries {
                let result = service
                    .process_payment_event(format!("evt{}", n), "updated", "u1", payload(*n))
                    .await
                    .unwrap();

                let expected = if seen.insert(*n) {
                    ProcessOutcome::Applied
                } else {
                    ProcessOutcome::Duplicate
                };
                prop_assert_eq!(result.outcome, expected);
            }

            prop_assert_eq!(ledger.len(), seen.len());
            prop_assert_eq!(store.update_count(), seen.len());
            for n in &seen {
                let row = ledger.row(&format!("evt{}", n)).unwrap();
                prop_assert!(row.processed);
                prop_assert_eq!(row.attempt_count, 0);
            }
            Ok(())
        })?;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_record_event_has_one_winner() {
    const CALLERS: usize = 16;
    let ledger = Arc::new(InMemoryEventLedger::new());
    let barrier = Arc::new(Barrier::new(CALLERS));
    let event_id = EventId::new("evt1").unwrap();
    let user_id = UserId::new("u1").unwrap();

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let ledger = ledger.clone();
            let barrier = barrier.clone();
            let event_id = event_id.clone();
            let user_id = user_id.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                ledger
                    .record_event(&event_id, "created", &user_id, &payload(0))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut recorded = Vec::with_capacity(CALLERS);
    for handle in handles {
        recorded.push(handle.await.unwrap());
    }

    let created = recorded.iter().filter(|r| !r.already_existed).count();
    assert_eq!(created, 1);
    assert_eq!(
        recorded.iter().filter(|r| r.already_existed).count(),
        CALLERS - 1
    );
    assert_eq!(ledger.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_deliveries_settle_on_one_processed_row() {
    const CALLERS: usize = 12;
    let (ledger, store, service) = setup();
    let barrier = Arc::new(Barrier::new(CALLERS));

    let handles: Vec<_> = (0..CALLERS)
        .map(|_| {
            let service = service.clone();
            let barrier = barrier.clone();
            tokio::spawn(async move {
                barrier.wait().await;
                service
                    .process_payment_event("evt1", "created", "u1", payload(0))
                    .await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(ledger.len(), 1);
    assert!(ledger.row("evt1").unwrap().processed);

    let record = store.record(&UserId::new("u1").unwrap()).unwrap();
    assert_eq!(record.plan, SubscriptionPlan::Premium);
    assert_eq!(record.status, SubscriptionStatus::Active);

    // Deliveries that arrive after the row is processed are pure no-ops.
    let writes = store.update_count();
    let late = service
        .process_payment_event("evt1", "created", "u1", payload(0))
        .await
        .unwrap();
    assert_eq!(late.outcome, ProcessOutcome::Duplicate);
    assert_eq!(store.update_count(), writes);
}

#[tokio::test]
async fn distinct_users_are_independent() {
    let ledger = Arc::new(InMemoryEventLedger::new());
    let store = Arc::new(InMemorySubscriptionStore::new());
    for id in ["a", "b", "c"] {
        store.insert_user(
            &UserId::new(id).unwrap(),
            &format!("{}@example.com", id),
            SubscriptionRecord::inactive(Timestamp::now()),
        );
    }
    let service = SubscriptionService::new(
        ledger.clone(),
        store.clone(),
        Arc::new(MockGatewayClient::new()),
        Arc::new(RecordingCacheInvalidator::new()),
    );

    let deliveries = ["a", "b", "c"].into_iter().map(|id| {
        let service = service.clone();
        async move {
            service
                .process_payment_event(format!("evt-{}", id), "created", id, payload(1))
                .await
        }
    });
    for result in join_all(deliveries).await {
        assert_eq!(result.unwrap().outcome, ProcessOutcome::Applied);
    }

    assert_eq!(ledger.len(), 3);
    for id in ["a", "b", "c"] {
        let record = store.record(&UserId::new(id).unwrap()).unwrap();
        assert_eq!(record.plan, SubscriptionPlan::Family);
    }
}
