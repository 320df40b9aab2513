//! Integration tests for the settlement engine against an in-memory store.

use benta_core::{CashChannel, CashDirection, Money, MovementReason, PaymentMethod, SaleStatus};
use benta_engine::{
    CartItem, CashAmounts, Engine, EngineError, ExpirationAction, ProductDraft, ProductLocks,
    RawProductRecord, SaleEngine, StockReconciler,
};
use benta_store::{Store, StoreConfig};
use chrono::{Duration, Utc};
use std::sync::Arc;

async fn engine() -> Engine {
    let store = Store::new(StoreConfig::in_memory()).await.unwrap();
    Engine::new(store)
}

async fn seed_product(engine: &Engine, name: &str, price_cents: i64, quantity: i64) -> String {
    engine
        .stock
        .create_product(ProductDraft::new(name, Money::from_centavos(price_cents), quantity))
        .await
        .unwrap()
        .id
}

fn one(product_id: &str, quantity: i64) -> Vec<CartItem> {
    vec![CartItem {
        product_id: product_id.to_string(),
        quantity,
    }]
}

// =============================================================================
// Sale commit
// =============================================================================

#[tokio::test]
async fn commit_decrements_stock_and_credits_channel() {
    let engine = engine().await;
    let id = seed_product(&engine, "Milk", 5000, 10).await;

    let sale = engine
        .sales
        .commit_sale(&one(&id, 3), PaymentMethod::Cash, None)
        .await
        .unwrap();

    assert_eq!(sale.status, SaleStatus::Completed);
    assert_eq!(sale.total_cents, 15_000);
    assert!(sale.paid_at.is_some());

    let product = engine.stock.get_product(&id).await.unwrap();
    assert_eq!(product.quantity, 7);

    let balances = engine.cash.balances().await.unwrap();
    assert_eq!(balances.cash_cents, 15_000);
    assert_eq!(balances.gcash_cents, 0);
}

#[tokio::test]
async fn commit_snapshots_name_and_price() {
    let engine = engine().await;
    let id = seed_product(&engine, "Old Name", 1000, 5).await;

    let sale = engine
        .sales
        .commit_sale(&one(&id, 1), PaymentMethod::Gcash, None)
        .await
        .unwrap();

    // Rename and reprice after the sale
    let mut draft = ProductDraft::new("New Name", Money::from_centavos(9999), 4);
    draft.min_stock = 5;
    engine.stock.update_product(&id, draft).await.unwrap();

    let details = engine.sales.get_sale(&sale.id).await.unwrap();
    assert_eq!(details.lines.len(), 1);
    assert_eq!(details.lines[0].name_snapshot, "Old Name");
    assert_eq!(details.lines[0].unit_price_cents, 1000);
}

#[tokio::test]
async fn insufficient_stock_rejects_whole_sale() {
    let engine = engine().await;
    let plenty = seed_product(&engine, "Plenty", 1000, 100).await;
    let scarce = seed_product(&engine, "Scarce", 2000, 2).await;

    let items = vec![
        CartItem {
            product_id: plenty.clone(),
            quantity: 5,
        },
        CartItem {
            product_id: scarce.clone(),
            quantity: 3,
        },
    ];

    let err = engine
        .sales
        .commit_sale(&items, PaymentMethod::Cash, None)
        .await
        .unwrap_err();
    match err {
        EngineError::InsufficientStock {
            available,
            requested,
            ..
        } => {
            assert_eq!(available, 2);
            assert_eq!(requested, 3);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // Nothing moved: not the stock of either product, not the channel
    assert_eq!(engine.stock.get_product(&plenty).await.unwrap().quantity, 100);
    assert_eq!(engine.stock.get_product(&scarce).await.unwrap().quantity, 2);
    assert_eq!(engine.cash.balances().await.unwrap().cash_cents, 0);
    assert!(engine.sales.list_sales().await.unwrap().is_empty());
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let engine = engine().await;
    let err = engine
        .sales
        .commit_sale(&[], PaymentMethod::Cash, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::EmptyCart));
}

#[tokio::test]
async fn duplicate_cart_lines_are_merged_before_the_stock_check() {
    let engine = engine().await;
    let id = seed_product(&engine, "Soda", 1500, 5).await;

    // 3 + 3 = 6 requested of 5 on hand: must fail even though each line
    // individually fits
    let items = vec![
        CartItem {
            product_id: id.clone(),
            quantity: 3,
        },
        CartItem {
            product_id: id.clone(),
            quantity: 3,
        },
    ];
    let err = engine
        .sales
        .commit_sale(&items, PaymentMethod::Cash, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientStock { .. }));

    // 2 + 2 = 4 fits and produces one merged line
    let items = vec![
        CartItem {
            product_id: id.clone(),
            quantity: 2,
        },
        CartItem {
            product_id: id.clone(),
            quantity: 2,
        },
    ];
    let sale = engine
        .sales
        .commit_sale(&items, PaymentMethod::Cash, None)
        .await
        .unwrap();
    let details = engine.sales.get_sale(&sale.id).await.unwrap();
    assert_eq!(details.lines.len(), 1);
    assert_eq!(details.lines[0].quantity, 4);
    assert_eq!(sale.total_cents, 6000);
}

#[tokio::test]
async fn invalid_quantities_are_rejected() {
    let engine = engine().await;
    let id = seed_product(&engine, "Gum", 500, 10).await;

    for quantity in [0, -1, 1000] {
        let err = engine
            .sales
            .commit_sale(&one(&id, quantity), PaymentMethod::Cash, None)
            .await
            .unwrap_err();
        assert!(
            matches!(err, EngineError::InvalidQuantity { .. }),
            "quantity {quantity} should be rejected"
        );
    }
}

#[tokio::test]
async fn unknown_product_is_rejected() {
    let engine = engine().await;
    let err = engine
        .sales
        .commit_sale(&one("no-such-id", 1), PaymentMethod::Cash, None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

// =============================================================================
// Credit sales and settlement
// =============================================================================

#[tokio::test]
async fn credit_sale_is_unpaid_and_touches_no_channel() {
    let engine = engine().await;
    let id = seed_product(&engine, "Rice", 6000, 10).await;

    let sale = engine
        .sales
        .commit_sale(
            &one(&id, 2),
            PaymentMethod::Credit,
            Some("Aling Nena".to_string()),
        )
        .await
        .unwrap();

    assert_eq!(sale.status, SaleStatus::Unpaid);
    assert!(sale.paid_at.is_none());

    // Stock still decrements at commit time
    assert_eq!(engine.stock.get_product(&id).await.unwrap().quantity, 8);

    // No channel credited
    let balances = engine.cash.balances().await.unwrap();
    assert_eq!(balances.cash_cents, 0);
    assert_eq!(balances.gcash_cents, 0);
    assert_eq!(balances.paymaya_cents, 0);
}

#[tokio::test]
async fn mark_paid_settles_exactly_once() {
    let engine = engine().await;
    let id = seed_product(&engine, "Eggs", 900, 12).await;

    let sale = engine
        .sales
        .commit_sale(&one(&id, 1), PaymentMethod::Credit, None)
        .await
        .unwrap();

    let paid = engine.sales.mark_paid(&sale.id).await.unwrap();
    assert_eq!(paid.status, SaleStatus::Completed);
    assert!(paid.paid_at.is_some());

    // Settlement does not credit a channel
    assert_eq!(engine.cash.balances().await.unwrap().cash_cents, 0);

    // Second settlement fails: the sale is no longer unpaid
    let err = engine.sales.mark_paid(&sale.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus { .. }));
}

#[tokio::test]
async fn mark_paid_rejects_cash_sales_and_missing_sales() {
    let engine = engine().await;
    let id = seed_product(&engine, "Bread", 4500, 5).await;

    let sale = engine
        .sales
        .commit_sale(&one(&id, 1), PaymentMethod::Cash, None)
        .await
        .unwrap();

    let err = engine.sales.mark_paid(&sale.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidStatus { .. }));

    let err = engine.sales.mark_paid("no-such-sale").await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn cancel_restores_stock_and_reports_the_refund() {
    let engine = engine().await;
    let id = seed_product(&engine, "Coffee", 8000, 10).await;

    let sale = engine
        .sales
        .commit_sale(&one(&id, 4), PaymentMethod::Gcash, None)
        .await
        .unwrap();
    assert_eq!(engine.cash.balances().await.unwrap().gcash_cents, 32_000);

    let refund = engine
        .sales
        .cancel_sale(&sale.id, "customer returned items")
        .await
        .unwrap();
    assert_eq!(refund.centavos(), 32_000);

    assert_eq!(engine.stock.get_product(&id).await.unwrap().quantity, 10);

    // The channel is NOT reversed automatically; the operator posts the
    // reported refund through the manual cash workflow
    assert_eq!(engine.cash.balances().await.unwrap().gcash_cents, 32_000);

    let cancelled = engine.sales.get_sale(&sale.id).await.unwrap().sale;
    assert_eq!(cancelled.status, SaleStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some("customer returned items")
    );

    // Audit trail shows the restore
    let movements = engine.stock.movements(&id).await.unwrap();
    assert!(movements
        .iter()
        .any(|m| m.reason == MovementReason::Cancellation && m.delta == 4));
}

#[tokio::test]
async fn cancellation_is_terminal() {
    let engine = engine().await;
    let id = seed_product(&engine, "Tea", 3000, 6).await;

    let sale = engine
        .sales
        .commit_sale(&one(&id, 2), PaymentMethod::Cash, None)
        .await
        .unwrap();

    engine.sales.cancel_sale(&sale.id, "wrong item").await.unwrap();

    // Second cancel must not restore stock again
    let err = engine
        .sales
        .cancel_sale(&sale.id, "again")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyCancelled { .. }));
    assert_eq!(engine.stock.get_product(&id).await.unwrap().quantity, 6);

    // And a cancelled sale cannot be settled
    let err = engine.sales.mark_paid(&sale.id).await.unwrap_err();
    assert!(matches!(err, EngineError::AlreadyCancelled { .. }));
}

#[tokio::test]
async fn cancel_requires_a_reason() {
    let engine = engine().await;
    let id = seed_product(&engine, "Juice", 2500, 5).await;
    let sale = engine
        .sales
        .commit_sale(&one(&id, 1), PaymentMethod::Cash, None)
        .await
        .unwrap();

    let err = engine.sales.cancel_sale(&sale.id, "  ").await.unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn cancel_serializes_with_quantity_edits() {
    let store = Store::new(StoreConfig::in_memory()).await.unwrap();
    let locks = Arc::new(ProductLocks::new());
    let stock = StockReconciler::new(store.clone(), locks.clone());
    let sales = SaleEngine::new(store.clone(), locks.clone());

    let id = stock
        .create_product(ProductDraft::new("Vinegar", Money::from_centavos(1200), 5))
        .await
        .unwrap()
        .id;
    let sale = sales
        .commit_sale(&one(&id, 3), PaymentMethod::Cash, None)
        .await
        .unwrap();

    // Hold the product lock the way a quantity edit does; the restore must
    // wait rather than interleave with the edit's read-then-write
    let guard = locks.acquire(&id).await;

    let cancelling_sales = sales.clone();
    let sale_id = sale.id.clone();
    let cancelling = tokio::spawn(async move {
        cancelling_sales.cancel_sale(&sale_id, "wrong item").await
    });

    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    assert!(!cancelling.is_finished());

    drop(guard);
    cancelling.await.unwrap().unwrap();
    assert_eq!(stock.get_product(&id).await.unwrap().quantity, 5);
}

#[tokio::test]
async fn cancelling_an_unpaid_credit_sale_refunds_nothing() {
    let engine = engine().await;
    let id = seed_product(&engine, "Sardines", 2200, 8).await;

    let sale = engine
        .sales
        .commit_sale(&one(&id, 3), PaymentMethod::Credit, None)
        .await
        .unwrap();

    let refund = engine
        .sales
        .cancel_sale(&sale.id, "order mistake")
        .await
        .unwrap();
    assert!(refund.is_zero());

    // Stock restored, channels untouched
    assert_eq!(engine.stock.get_product(&id).await.unwrap().quantity, 8);
    assert_eq!(engine.cash.balances().await.unwrap().cash_cents, 0);
}

// =============================================================================
// Expiration tracking
// =============================================================================

#[tokio::test]
async fn restock_with_date_creates_an_alertable_batch() {
    let engine = engine().await;
    let id = seed_product(&engine, "Yogurt", 3500, 0).await;

    let soon = Utc::now().date_naive() + Duration::days(3);
    engine
        .stock
        .restock(&id, 12, Some("delivery"), Some(soon))
        .await
        .unwrap();

    assert_eq!(engine.stock.get_product(&id).await.unwrap().quantity, 12);

    let alerts = engine.expiration.near_expiration(7).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].product_id, id);
    assert_eq!(alerts[0].quantity, 12);

    // Outside the horizon: nothing
    let alerts = engine.expiration.near_expiration(1).await.unwrap();
    assert!(alerts.is_empty());
}

#[tokio::test]
async fn pulling_expired_stock_decrements_both_product_and_batch() {
    let engine = engine().await;
    let id = seed_product(&engine, "Cheese", 7000, 0).await;

    let soon = Utc::now().date_naive() + Duration::days(2);
    engine.stock.restock(&id, 10, None, Some(soon)).await.unwrap();

    let pulled = engine
        .expiration
        .resolve(&id, soon, ExpirationAction::Pull, Some(4))
        .await
        .unwrap();
    assert_eq!(pulled, 4);
    assert_eq!(engine.stock.get_product(&id).await.unwrap().quantity, 6);

    let alerts = engine.expiration.near_expiration(7).await.unwrap();
    assert_eq!(alerts[0].quantity, 6);

    // Pull the rest without naming a quantity: defaults to the whole batch
    let pulled = engine
        .expiration
        .resolve(&id, soon, ExpirationAction::Pull, None)
        .await
        .unwrap();
    assert_eq!(pulled, 6);
    assert_eq!(engine.stock.get_product(&id).await.unwrap().quantity, 0);
    assert!(engine.expiration.near_expiration(7).await.unwrap().is_empty());
}

#[tokio::test]
async fn clearing_an_alert_leaves_stock_alone() {
    let engine = engine().await;
    let id = seed_product(&engine, "Butter", 9500, 0).await;

    let soon = Utc::now().date_naive() + Duration::days(1);
    engine.stock.restock(&id, 5, None, Some(soon)).await.unwrap();

    let pulled = engine
        .expiration
        .resolve(&id, soon, ExpirationAction::Clear, None)
        .await
        .unwrap();
    assert_eq!(pulled, 0);

    assert_eq!(engine.stock.get_product(&id).await.unwrap().quantity, 5);
    assert!(engine.expiration.near_expiration(7).await.unwrap().is_empty());
}

#[tokio::test]
async fn pull_cannot_exceed_the_batch() {
    let engine = engine().await;
    let id = seed_product(&engine, "Ham", 12_000, 0).await;

    let soon = Utc::now().date_naive() + Duration::days(2);
    engine.stock.restock(&id, 3, None, Some(soon)).await.unwrap();

    let err = engine
        .expiration
        .resolve(&id, soon, ExpirationAction::Pull, Some(5))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidQuantity { .. }));
    assert_eq!(engine.stock.get_product(&id).await.unwrap().quantity, 3);
}

#[tokio::test]
async fn sales_trim_batches_so_they_never_exceed_stock() {
    let engine = engine().await;
    let id = seed_product(&engine, "Tofu", 1800, 0).await;

    let soon = Utc::now().date_naive() + Duration::days(2);
    engine.stock.restock(&id, 10, None, Some(soon)).await.unwrap();

    // Sell 7 of 10: the batch must shrink to at most the remaining 3
    engine
        .sales
        .commit_sale(&one(&id, 7), PaymentMethod::Cash, None)
        .await
        .unwrap();

    let alerts = engine.expiration.near_expiration(7).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].quantity, 3);
    assert_eq!(alerts[0].product_quantity, 3);
}

#[tokio::test]
async fn quantity_edits_trim_batches_and_log_the_adjustment() {
    let engine = engine().await;
    let id = seed_product(&engine, "Gelatin", 2400, 0).await;

    let soon = Utc::now().date_naive() + Duration::days(3);
    engine.stock.restock(&id, 10, None, Some(soon)).await.unwrap();

    // Edit the quantity down: the batch must shrink with it
    let mut draft = ProductDraft::new("Gelatin", Money::from_centavos(2400), 4);
    draft.min_stock = 5;
    engine.stock.update_product(&id, draft).await.unwrap();

    assert_eq!(engine.stock.get_product(&id).await.unwrap().quantity, 4);

    let alerts = engine.expiration.near_expiration(7).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].quantity, 4);

    // The edit left an adjustment in the audit trail
    let movements = engine.stock.movements(&id).await.unwrap();
    assert!(movements
        .iter()
        .any(|m| m.reason == MovementReason::Adjustment && m.delta == -6));
}

// =============================================================================
// Cash ledger
// =============================================================================

#[tokio::test]
async fn single_channel_transaction_updates_balance_and_log() {
    let engine = engine().await;

    let balances = engine
        .cash
        .apply_transaction(CashChannel::Gcash, CashDirection::Add, 7_500, "gcash top-up", None)
        .await
        .unwrap();
    assert_eq!(balances.gcash_cents, 7_500);
    assert_eq!(balances.cash_cents, 0);

    let log = engine.cash.transactions(10).await.unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].channel, CashChannel::Gcash);
    assert_eq!(log[0].direction, CashDirection::Add);
    assert_eq!(log[0].amount_cents, 7_500);
    assert_eq!(log[0].reason, "gcash top-up");

    let err = engine
        .cash
        .apply_transaction(CashChannel::Cash, CashDirection::Remove, -1, "bad", None)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn manual_update_logs_one_entry_per_channel() {
    let engine = engine().await;

    let balances = engine
        .cash
        .apply_manual_update(
            CashAmounts {
                cash_cents: Some(50_000),
                gcash_cents: None,
                paymaya_cents: Some(2_000),
            },
            CashDirection::Add,
            "opening float",
            None,
        )
        .await
        .unwrap();

    assert_eq!(balances.cash_cents, 50_000);
    assert_eq!(balances.gcash_cents, 0);
    assert_eq!(balances.paymaya_cents, 2_000);

    // Two channels supplied: two log entries sharing the reason
    let log = engine.cash.transactions(10).await.unwrap();
    assert_eq!(log.len(), 2);
    assert!(log.iter().all(|t| t.amount_cents > 0));
    assert!(log.iter().all(|t| t.reason == "opening float"));
}

#[tokio::test]
async fn removal_may_push_a_balance_negative() {
    let engine = engine().await;

    let balances = engine
        .cash
        .apply_manual_update(
            CashAmounts {
                paymaya_cents: Some(2_000),
                ..Default::default()
            },
            CashDirection::Remove,
            "shortage correction",
            None,
        )
        .await
        .unwrap();

    assert_eq!(balances.paymaya_cents, -2_000);
}

#[tokio::test]
async fn manual_update_rejects_bad_input() {
    let engine = engine().await;

    // Amounts are always positive; the direction carries the sign
    let err = engine
        .cash
        .apply_manual_update(
            CashAmounts {
                cash_cents: Some(-100),
                ..Default::default()
            },
            CashDirection::Remove,
            "bad",
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));

    let err = engine
        .cash
        .apply_manual_update(
            CashAmounts {
                cash_cents: Some(100),
                ..Default::default()
            },
            CashDirection::Add,
            "   ",
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

// =============================================================================
// Bulk import
// =============================================================================

fn raw(name: &str, price: &str, quantity: &str) -> RawProductRecord {
    RawProductRecord {
        name: Some(name.to_string()),
        price: Some(price.to_string()),
        quantity: Some(quantity.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn import_is_all_or_nothing() {
    let engine = engine().await;

    let records = vec![
        raw("Good Row", "10.50", "5"),
        RawProductRecord {
            name: None,
            price: Some("abc".to_string()),
            ..Default::default()
        },
    ];

    let err = engine.import.import(&records).await.unwrap_err();
    match err {
        EngineError::Import(rows) => {
            // Row 2 fails on both name and price
            assert!(rows.iter().all(|r| r.row == 2));
            assert!(rows.iter().any(|r| r.field == "name"));
            assert!(rows.iter().any(|r| r.field == "price"));
        }
        other => panic!("expected Import, got {other:?}"),
    }

    // The good row was not written either
    assert!(engine.stock.list_products().await.unwrap().is_empty());
}

#[tokio::test]
async fn import_commits_valid_files() {
    let engine = engine().await;

    let mut second = raw("Pancit Canton", "15.00", "24");
    second.barcode = Some("4800016644931".to_string());

    let products = engine
        .import
        .import(&[raw("Sky Flakes", "8.25", "0"), second])
        .await
        .unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].price_cents, 825);
    assert_eq!(products[1].quantity, 24);

    let found = engine.stock.get_by_barcode("4800016644931").await.unwrap();
    assert_eq!(found.name, "Pancit Canton");
}

#[tokio::test]
async fn import_defaults_blank_price_to_zero() {
    let engine = engine().await;

    // Price left blank entirely, and blank quantity on the second row
    let records = vec![
        RawProductRecord {
            name: Some("Blank Price Item".to_string()),
            quantity: Some("3".to_string()),
            ..Default::default()
        },
        RawProductRecord {
            name: Some("Blank Everything".to_string()),
            price: Some("  ".to_string()),
            ..Default::default()
        },
    ];

    let products = engine.import.import(&records).await.unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0].price_cents, 0);
    assert_eq!(products[0].quantity, 3);
    assert_eq!(products[1].price_cents, 0);
    assert_eq!(products[1].quantity, 0);
}

#[tokio::test]
async fn import_rejects_barcode_collisions() {
    let engine = engine().await;

    let mut existing = ProductDraft::new("Existing", Money::from_centavos(100), 1);
    existing.barcode = Some("DUP-001".to_string());
    engine.stock.create_product(existing).await.unwrap();

    // Collides with the database
    let mut a = raw("A", "1.00", "1");
    a.barcode = Some("DUP-001".to_string());
    // Collides within the file
    let mut b = raw("B", "1.00", "1");
    b.barcode = Some("NEW-001".to_string());
    let mut c = raw("C", "1.00", "1");
    c.barcode = Some("NEW-001".to_string());

    let err = engine.import.import(&[a, b, c]).await.unwrap_err();
    match err {
        EngineError::Import(rows) => {
            assert_eq!(rows.len(), 2);
            assert!(rows.iter().any(|r| r.row == 1));
            assert!(rows.iter().any(|r| r.row == 3));
        }
        other => panic!("expected Import, got {other:?}"),
    }
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_commits_never_oversell() {
    let engine = engine().await;
    let id = seed_product(&engine, "Limited", 1000, 5).await;

    let mut handles = Vec::new();
    for _ in 0..12 {
        let engine = engine.clone();
        let id = id.clone();
        handles.push(tokio::spawn(async move {
            engine
                .sales
                .commit_sale(
                    &[CartItem {
                        product_id: id,
                        quantity: 1,
                    }],
                    PaymentMethod::Cash,
                    None,
                )
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(EngineError::InsufficientStock { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    // Exactly the available stock sold, never more
    assert_eq!(successes, 5);
    assert_eq!(engine.stock.get_product(&id).await.unwrap().quantity, 0);
    assert_eq!(engine.cash.balances().await.unwrap().cash_cents, 5000);
}
