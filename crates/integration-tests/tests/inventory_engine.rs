//! End-to-end tests for the batch engine: receive, plan, commit, scan.
//!
//! These run against the in-memory repository, exercising the same service
//! compositions the surrounding application uses.

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;

use stockroom_core::{BatchStatus, ProductId};
use stockroom_inventory::db::{BatchRepository, CommitError, MemoryBatchRepository};
use stockroom_inventory::models::{Alert, ReceiveBatchInput};
use stockroom_inventory::services::{
    AllocationCommitter, ConflictDetector, ExpiryScanner, FifoAllocator, ReceivingService,
};
use stockroom_integration_tests::init_tracing;

fn receipt(product_id: i32, quantity: i32, prod_date: Option<NaiveDate>) -> ReceiveBatchInput {
    ReceiveBatchInput {
        product_id: ProductId::new(product_id),
        quantity,
        prod_date,
        exp_date: None,
        supplier_id: None,
        supplier_order_id: None,
        cost_price: Some(Decimal::new(999, 2)),
        notes: None,
    }
}

fn days_from_now(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

#[tokio::test]
async fn test_receive_allocate_commit_lifecycle() {
    init_tracing();
    let repo = MemoryBatchRepository::new();
    let product = ProductId::new(42);

    // Two receipts on different production dates.
    let receiving = ReceivingService::new(&repo);
    let older = receiving
        .receive(&receipt(42, 5, Some(days_from_now(-200))))
        .await
        .expect("receive older");
    let newer = receiving
        .receive(&receipt(42, 10, Some(days_from_now(-100))))
        .await
        .expect("receive newer");

    // Plan 8: all of the older batch, 3 of the newer.
    let plan = FifoAllocator::new(&repo)
        .allocate(product, 8)
        .await
        .expect("plan");
    assert!(plan.can_fulfill);
    assert_eq!(plan.total_available, 15);
    let consumed: Vec<(i32, i32)> = plan
        .lines
        .iter()
        .map(|l| (l.batch_id.as_i32(), l.quantity))
        .collect();
    assert_eq!(
        consumed,
        vec![(older.batch.id.as_i32(), 5), (newer.batch.id.as_i32(), 3)]
    );
    assert!(
        plan.alerts
            .iter()
            .any(|a| matches!(a, Alert::MultipleBatches { .. }))
    );
    // Cost provenance flows through to the pick lines.
    assert!(plan.lines.iter().all(|l| l.cost_price.is_some()));

    // Commit and verify depletion semantics.
    AllocationCommitter::new(&repo)
        .commit(&plan.lines)
        .await
        .expect("commit");
    let older_after = repo
        .get_batch(older.batch.id)
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(older_after.quantity, 0);
    assert_eq!(older_after.status, BatchStatus::Depleted);
    assert_eq!(older_after.original_quantity, 5);

    // Remaining stock: 7 units in the newer batch.
    let rest = FifoAllocator::new(&repo)
        .allocate(product, 7)
        .await
        .expect("plan rest");
    assert!(rest.can_fulfill);
    AllocationCommitter::new(&repo)
        .commit(&rest.lines)
        .await
        .expect("commit rest");

    // Everything depleted: next plan reports NO_STOCK.
    let empty = FifoAllocator::new(&repo)
        .allocate(product, 1)
        .await
        .expect("plan empty");
    assert!(!empty.can_fulfill);
    assert!(matches!(empty.alerts.as_slice(), [Alert::NoStock { .. }]));
}

#[tokio::test]
async fn test_concurrent_plans_second_commit_must_replan() {
    init_tracing();
    let repo = MemoryBatchRepository::new();
    let product = ProductId::new(7);

    ReceivingService::new(&repo)
        .receive(&receipt(7, 6, Some(days_from_now(-30))))
        .await
        .expect("receive");

    // Both callers plan against the same snapshot.
    let allocator = FifoAllocator::new(&repo);
    let plan_a = allocator.allocate(product, 4).await.expect("plan a");
    let plan_b = allocator.allocate(product, 4).await.expect("plan b");
    assert!(plan_a.can_fulfill && plan_b.can_fulfill);

    let committer = AllocationCommitter::new(&repo);
    committer.commit(&plan_a.lines).await.expect("commit a");

    let err = committer
        .commit(&plan_b.lines)
        .await
        .expect_err("stale commit must fail");
    assert!(matches!(err, CommitError::StalePlan { .. }));

    // Re-planning reflects committed reality.
    let replanned = allocator.allocate(product, 4).await.expect("re-plan");
    assert!(!replanned.can_fulfill);
    assert_eq!(replanned.total_available, 2);
}

#[tokio::test]
async fn test_receiving_conflict_advisory_and_expiry_scan() {
    init_tracing();
    let repo = MemoryBatchRepository::new();
    let product = ProductId::new(3);
    repo.set_product_name(product, "Oat milk 1L");

    let receiving = ReceivingService::new(&repo);
    let mut first = receipt(3, 20, Some(days_from_now(-10)));
    first.exp_date = Some(days_from_now(12));
    let first = receiving.receive(&first).await.expect("receive first");
    assert!(first.conflict_alert.is_none());

    // Same product, different dates: advisory conflict, receipt proceeds.
    let mut second = receipt(3, 15, Some(days_from_now(-5)));
    second.exp_date = Some(days_from_now(25));
    let second = receiving.receive(&second).await.expect("receive second");
    match &second.conflict_alert {
        Some(Alert::DateConflict { existing, .. }) => assert_eq!(existing.len(), 1),
        other => panic!("expected DateConflict advisory, got {other:?}"),
    }

    // Both batches show up in the 30-day scan, soonest first.
    let entries = ExpiryScanner::new(&repo)
        .scan_expiring(30)
        .await
        .expect("scan");
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries.first().map(|e| e.batch_id),
        Some(first.batch.id)
    );
    assert!(
        entries
            .iter()
            .all(|e| e.product_name.as_deref() == Some("Oat milk 1L"))
    );

    // The detector sees both batches once they exist.
    let check = ConflictDetector::new(&repo)
        .check_conflicts(product, None, None)
        .await
        .expect("check");
    assert!(check.has_alert());
    assert_eq!(check.existing_batches.len(), 2);
}

#[tokio::test]
async fn test_mark_expired_removes_batch_from_allocation() {
    init_tracing();
    let repo = MemoryBatchRepository::new();
    let product = ProductId::new(9);

    let received = ReceivingService::new(&repo)
        .receive(&receipt(9, 10, Some(days_from_now(-400))))
        .await
        .expect("receive");

    let marked = repo
        .mark_expired(received.batch.id)
        .await
        .expect("mark expired");
    assert_eq!(marked.status, BatchStatus::Expired);
    assert_eq!(marked.quantity, 10);

    let plan = FifoAllocator::new(&repo)
        .allocate(product, 1)
        .await
        .expect("plan");
    assert!(!plan.can_fulfill);
    assert!(matches!(plan.alerts.as_slice(), [Alert::NoStock { .. }]));
}
