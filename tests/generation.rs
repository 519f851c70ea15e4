//! Orchestrator behavior: credit enforcement, failure semantics, and the
//! accepted same-account race.

mod support;

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use recibo::application::generation::{
    GenerateReceiptCommand, GenerationError, GenerationService,
};
use recibo::domain::layout::LayoutSchema;
use recibo::domain::receipt::{BusinessInfo, ReceiptItem};
use recibo::domain::types::Credits;

use support::{InMemoryReceipts, InMemoryUsers, MemoryStore, StubRasterizer, user_record};

fn dec(value: &str) -> Decimal {
    value.parse().expect("decimal literal")
}

fn sample_command() -> GenerateReceiptCommand {
    GenerateReceiptCommand {
        layout: LayoutSchema::default_layout(),
        business_info: BusinessInfo {
            name: "Acme".to_string(),
            address: "1 Main St".to_string(),
            phone: "555-0100".to_string(),
            email: "a@acme.com".to_string(),
            logo_url: None,
        },
        items: vec![ReceiptItem {
            name: "Widget".to_string(),
            quantity: 2,
            price: dec("10.00"),
            total: dec("20.00"),
        }],
        subtotal: dec("20.00"),
        tax: dec("1.60"),
        total: dec("21.60"),
        receipt_number: Some("R-001".to_string()),
        date: Some("02/01/2026".to_string()),
        notes: None,
    }
}

struct Harness {
    users: Arc<InMemoryUsers>,
    receipts: Arc<InMemoryReceipts>,
    store: Arc<MemoryStore>,
    service: GenerationService,
}

fn harness_with(
    users: InMemoryUsers,
    receipts: InMemoryReceipts,
    rasterizer: StubRasterizer,
    store: MemoryStore,
) -> Harness {
    let users = Arc::new(users);
    let receipts = Arc::new(receipts);
    let store = Arc::new(store);
    let service = GenerationService::new(
        users.clone(),
        receipts.clone(),
        Arc::new(rasterizer),
        store.clone(),
    );
    Harness {
        users,
        receipts,
        store,
        service,
    }
}

#[tokio::test]
async fn successful_generation_decrements_exactly_once() {
    let user_id = Uuid::new_v4();
    let harness = harness_with(
        InMemoryUsers::with_user(user_record(user_id, 3)),
        InMemoryReceipts::default(),
        StubRasterizer::default(),
        MemoryStore::default(),
    );

    let outcome = harness
        .service
        .generate(user_id, sample_command())
        .await
        .expect("generation succeeds");

    assert_eq!(outcome.remaining_credits, Credits(2));
    assert_eq!(harness.users.credits_of(user_id), 2);
    assert_eq!(harness.receipts.count(), 1);
    assert_eq!(harness.store.object_count(), 2);

    assert!(outcome.pdf_url.ends_with("-receipt.pdf"));
    assert!(outcome.png_url.ends_with("-receipt.png"));
    assert!(outcome.pdf_url.contains(&user_id.to_string()));

    let receipt = outcome.receipt.expect("receipt persisted");
    assert_eq!(receipt.user_id, user_id);
    assert_eq!(receipt.total, dec("21.60"));
}

#[tokio::test]
async fn zero_balance_is_rejected_with_payment_required() {
    let user_id = Uuid::new_v4();
    let harness = harness_with(
        InMemoryUsers::with_user(user_record(user_id, 0)),
        InMemoryReceipts::default(),
        StubRasterizer::default(),
        MemoryStore::default(),
    );

    let error = harness
        .service
        .generate(user_id, sample_command())
        .await
        .expect_err("must reject");

    assert!(matches!(error, GenerationError::PaymentRequired));
    assert_eq!(harness.users.credits_of(user_id), 0);
    assert_eq!(harness.receipts.count(), 0);
}

#[tokio::test]
async fn banned_user_is_rejected_despite_positive_balance() {
    let user_id = Uuid::new_v4();
    let mut record = user_record(user_id, 10);
    record.is_banned = true;
    let harness = harness_with(
        InMemoryUsers::with_user(record),
        InMemoryReceipts::default(),
        StubRasterizer::default(),
        MemoryStore::default(),
    );

    let error = harness
        .service
        .generate(user_id, sample_command())
        .await
        .expect_err("must reject");

    assert!(matches!(error, GenerationError::Banned));
    assert_eq!(harness.users.credits_of(user_id), 10);
}

#[tokio::test]
async fn unlimited_balance_never_decrements() {
    let user_id = Uuid::new_v4();
    let harness = harness_with(
        InMemoryUsers::with_user(user_record(user_id, Credits::UNLIMITED)),
        InMemoryReceipts::default(),
        StubRasterizer::default(),
        MemoryStore::default(),
    );

    let outcome = harness
        .service
        .generate(user_id, sample_command())
        .await
        .expect("generation succeeds");

    assert_eq!(outcome.remaining_credits, Credits::unlimited());
    assert_eq!(harness.users.credits_of(user_id), Credits::UNLIMITED);
}

#[tokio::test]
async fn rasterizer_failure_consumes_nothing() {
    let user_id = Uuid::new_v4();
    let harness = harness_with(
        InMemoryUsers::with_user(user_record(user_id, 5)),
        InMemoryReceipts::default(),
        StubRasterizer::failing(),
        MemoryStore::default(),
    );

    let error = harness
        .service
        .generate(user_id, sample_command())
        .await
        .expect_err("must fail");

    assert!(matches!(error, GenerationError::Render(_)));
    // Scenario: engine failure leaves no receipt row, no artifacts, and the
    // balance untouched.
    assert_eq!(harness.users.credits_of(user_id), 5);
    assert_eq!(harness.receipts.count(), 0);
    assert_eq!(harness.store.object_count(), 0);
}

#[tokio::test]
async fn storage_and_persistence_failures_still_decrement_exactly_once() {
    let user_id = Uuid::new_v4();
    let harness = harness_with(
        InMemoryUsers::with_user(user_record(user_id, 2)),
        InMemoryReceipts::failing_inserts(),
        StubRasterizer::default(),
        MemoryStore::failing_writes(),
    );

    let outcome = harness
        .service
        .generate(user_id, sample_command())
        .await
        .expect("request still succeeds");

    // Rendering succeeded, so the credit is consumed once; the URLs are
    // derived from the keys even though neither sub-step confirmed.
    assert_eq!(outcome.remaining_credits, Credits(1));
    assert_eq!(harness.users.credits_of(user_id), 1);
    assert!(outcome.receipt.is_none());
    assert!(outcome.pdf_url.ends_with("-receipt.pdf"));
    assert_eq!(harness.store.object_count(), 0);
}

#[tokio::test]
async fn empty_items_are_rejected_before_rendering() {
    let user_id = Uuid::new_v4();
    let rasterizer = StubRasterizer::default();
    let harness = harness_with(
        InMemoryUsers::with_user(user_record(user_id, 3)),
        InMemoryReceipts::default(),
        rasterizer,
        MemoryStore::default(),
    );

    let mut command = sample_command();
    command.items.clear();

    let error = harness
        .service
        .generate(user_id, command)
        .await
        .expect_err("must reject");

    assert!(matches!(error, GenerationError::Validation(_)));
    assert_eq!(harness.users.credits_of(user_id), 3);
}

#[tokio::test]
async fn unknown_user_is_rejected() {
    let harness = harness_with(
        InMemoryUsers::default(),
        InMemoryReceipts::default(),
        StubRasterizer::default(),
        MemoryStore::default(),
    );

    let error = harness
        .service
        .generate(Uuid::new_v4(), sample_command())
        .await
        .expect_err("must reject");

    assert!(matches!(error, GenerationError::UserNotFound));
}

/// The same-account overdraft race is accepted: two requests that both pass
/// the credit check may both render and drive the balance negative. The
/// outcome is flagged (warn log, negative balance), never silent.
#[tokio::test]
async fn concurrent_requests_with_one_credit_may_overdraw() {
    let user_id = Uuid::new_v4();
    let harness = harness_with(
        InMemoryUsers::with_user(user_record(user_id, 1)),
        InMemoryReceipts::default(),
        StubRasterizer::default(),
        MemoryStore::default(),
    );

    let first = harness.service.generate(user_id, sample_command());
    let second = harness.service.generate(user_id, sample_command());
    let (first, second) = tokio::join!(first, second);

    let successes = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert!(successes >= 1, "at least one request must succeed");

    // Balance dropped by exactly the number of successful generations; with
    // both succeeding the account sits at -1, the documented race outcome.
    assert_eq!(harness.users.credits_of(user_id), 1 - successes as i64);
    assert_eq!(harness.receipts.count(), successes);
}
