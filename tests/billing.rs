//! Billing event application: credit resets across the subscription
//! lifecycle.

mod support;

use std::sync::Arc;

use uuid::Uuid;

use recibo::application::billing::{BillingEvent, BillingService};
use recibo::domain::types::Credits;

use support::{InMemorySubscriptions, InMemoryUsers, user_record};

fn service(
    users: Arc<InMemoryUsers>,
    subscriptions: Arc<InMemorySubscriptions>,
) -> BillingService {
    BillingService::new(subscriptions, users, 3)
}

#[tokio::test]
async fn checkout_completion_grants_unlimited_credits() {
    let user_id = Uuid::new_v4();
    let users = Arc::new(InMemoryUsers::with_user(user_record(user_id, 3)));
    let subscriptions = Arc::new(InMemorySubscriptions::default());
    let billing = service(users.clone(), subscriptions.clone());

    billing
        .apply(BillingEvent::CheckoutCompleted {
            user_id,
            customer_id: "cus_1".to_string(),
            subscription_id: Some("sub_1".to_string()),
        })
        .await
        .expect("apply");

    assert_eq!(users.credits_of(user_id), Credits::UNLIMITED);
    assert_eq!(subscriptions.status_of("cus_1").as_deref(), Some("active"));
}

#[tokio::test]
async fn non_active_update_resets_to_free_tier() {
    let user_id = Uuid::new_v4();
    let users = Arc::new(InMemoryUsers::with_user(user_record(
        user_id,
        Credits::UNLIMITED,
    )));
    let subscriptions = Arc::new(InMemorySubscriptions::default());
    let billing = service(users.clone(), subscriptions.clone());

    billing
        .apply(BillingEvent::CheckoutCompleted {
            user_id,
            customer_id: "cus_2".to_string(),
            subscription_id: Some("sub_2".to_string()),
        })
        .await
        .expect("seed subscription");

    billing
        .apply(BillingEvent::SubscriptionUpdated {
            customer_id: "cus_2".to_string(),
            subscription_id: Some("sub_2".to_string()),
            status: "past_due".to_string(),
        })
        .await
        .expect("apply update");

    assert_eq!(users.credits_of(user_id), 3);
}

#[tokio::test]
async fn deletion_cancels_and_resets_to_free_tier() {
    let user_id = Uuid::new_v4();
    let users = Arc::new(InMemoryUsers::with_user(user_record(
        user_id,
        Credits::UNLIMITED,
    )));
    let subscriptions = Arc::new(InMemorySubscriptions::default());
    let billing = service(users.clone(), subscriptions.clone());

    billing
        .apply(BillingEvent::CheckoutCompleted {
            user_id,
            customer_id: "cus_3".to_string(),
            subscription_id: Some("sub_3".to_string()),
        })
        .await
        .expect("seed subscription");

    billing
        .apply(BillingEvent::SubscriptionDeleted {
            customer_id: "cus_3".to_string(),
        })
        .await
        .expect("apply deletion");

    assert_eq!(users.credits_of(user_id), 3);
    assert_eq!(
        subscriptions.status_of("cus_3").as_deref(),
        Some("canceled")
    );
}

#[tokio::test]
async fn events_for_unknown_customers_are_ignored() {
    let user_id = Uuid::new_v4();
    let users = Arc::new(InMemoryUsers::with_user(user_record(user_id, 3)));
    let subscriptions = Arc::new(InMemorySubscriptions::default());
    let billing = service(users.clone(), subscriptions);

    billing
        .apply(BillingEvent::SubscriptionDeleted {
            customer_id: "cus_unknown".to_string(),
        })
        .await
        .expect("ignored without error");

    assert_eq!(users.credits_of(user_id), 3);
}
