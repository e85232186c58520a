//! End-to-end behaviour of `ComandaService` over the in-memory store.

mod common;

use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;

use comanda_core::{ComandaStatus, FixedClock, Money, PaymentMethod};
use comanda_service::{AddItemRequest, CloseRequest, ComandaService, ErrorCode};

use common::*;

// =============================================================================
// Item mutations
// =============================================================================

#[tokio::test]
async fn unit_items_merge_into_one_line() {
    let h = memory_harness();
    let comanda = h.service.create(12).await.unwrap();

    h.service
        .add_item(&comanda.id, AddItemRequest::new(SODA).quantity(2))
        .await
        .unwrap();
    let updated = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(SODA))
        .await
        .unwrap();

    assert_eq!(updated.items.len(), 1);
    assert_eq!(updated.items[0].quantity, 3);
    assert_eq!(updated.items[0].price, Money::from_cents(950));
    assert_eq!(updated.items_count, 3);
    assert_eq!(updated.total, Money::from_cents(2850));
    assert_eq!(updated.version, 2);
}

#[tokio::test]
async fn weight_items_are_priced_by_grams_and_never_merge() {
    let h = memory_harness();
    let comanda = h.service.create(1).await.unwrap();

    let first = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(BUFFET).weight_grams(250))
        .await
        .unwrap();
    assert_eq!(first.total, Money::from_cents(1000));

    let second = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(BUFFET).weight_grams(250))
        .await
        .unwrap();

    assert_eq!(second.items.len(), 2);
    assert!(second.items.iter().all(|i| i.weight_grams == Some(250)));
    assert_eq!(second.items_count, 2);
    assert_eq!(second.total, Money::from_cents(2000));
}

#[tokio::test]
async fn weight_price_is_rounded_half_up() {
    let h = memory_harness();
    let comanda = h.service.create(1).await.unwrap();

    // 333 g at 49.90/kg = 16.6167 → 16.62
    let updated = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(SALAD).weight_grams(333))
        .await
        .unwrap();

    assert_eq!(updated.total, Money::from_cents(1662));
}

#[tokio::test]
async fn add_item_failures() {
    let h = memory_harness();
    let comanda = h.service.create(1).await.unwrap();

    let err = h
        .service
        .add_item(&comanda.id, AddItemRequest::new("nope"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProductNotFound);
    assert_eq!(err.status(), 404);

    let err = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(RETIRED))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProductInactive);

    let err = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(BUFFET))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::MissingWeight);
    assert_eq!(err.status(), 400);

    let err = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(SODA).quantity(0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = h
        .service
        .add_item("missing", AddItemRequest::new(SODA))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ComandaNotFound);

    let unchanged = h.service.get(&comanda.id).await.unwrap();
    assert!(unchanged.items.is_empty());
    assert_eq!(unchanged.version, 0);
}

#[tokio::test]
async fn amounts_beyond_cents_range_are_rejected_and_nothing_is_saved() {
    let h = memory_harness();
    let comanda = h.service.create(1).await.unwrap();
    let before = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(SODA).quantity(2))
        .await
        .unwrap();
    let item_id = before.items[0].id.clone();

    let oversized = [
        AddItemRequest::new(SODA).quantity(i64::MAX / 2),
        AddItemRequest::new(SODA).quantity(i64::MAX),
        AddItemRequest::new(JUICE).quantity(i64::MAX / 2),
        AddItemRequest::new(BUFFET).weight_grams(i64::MAX / 2),
        AddItemRequest::new(BUFFET).weight_grams(i64::MAX),
    ];
    for request in oversized {
        let err = h.service.add_item(&comanda.id, request).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.status(), 400);
    }

    for delta in [i64::MAX / 2, i64::MAX] {
        let err = h
            .service
            .adjust_quantity(&comanda.id, &item_id, delta)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    let stored = h.service.get(&comanda.id).await.unwrap();
    assert_eq!(stored, before);
    assert_eq!(stored.total, Money::from_cents(1900));

    // A cash close still needs real money on the table
    let err = h
        .service
        .close(&comanda.id, CloseRequest::cash(Money::zero()))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CashInsufficient);
}

#[tokio::test]
async fn observation_is_stored_on_new_items() {
    let h = memory_harness();
    let comanda = h.service.create(1).await.unwrap();

    let updated = h
        .service
        .add_item(
            &comanda.id,
            AddItemRequest::new(JUICE).observation("sem açúcar"),
        )
        .await
        .unwrap();
    assert_eq!(updated.items[0].observation.as_deref(), Some("sem açúcar"));

    // Merging keeps the existing note.
    let merged = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(JUICE).observation("com gelo"))
        .await
        .unwrap();
    assert_eq!(merged.items[0].quantity, 2);
    assert_eq!(merged.items[0].observation.as_deref(), Some("sem açúcar"));
}

#[tokio::test]
async fn adjust_quantity_updates_and_removes() {
    let h = memory_harness();
    let comanda = h.service.create(1).await.unwrap();
    let with_items = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(SODA).quantity(2))
        .await
        .unwrap();
    h.service
        .add_item(&comanda.id, AddItemRequest::new(JUICE))
        .await
        .unwrap();
    let soda_id = with_items.items[0].id.clone();

    let updated = h
        .service
        .adjust_quantity(&comanda.id, &soda_id, 3)
        .await
        .unwrap();
    assert_eq!(updated.items_count, 6);
    assert_eq!(updated.total, Money::from_cents(5 * 950 + 700));

    let removed = h
        .service
        .adjust_quantity(&comanda.id, &soda_id, -5)
        .await
        .unwrap();
    assert_eq!(removed.items.len(), 1);
    assert_eq!(removed.items_count, 1);
    assert_eq!(removed.total, Money::from_cents(700));

    let err = h
        .service
        .adjust_quantity(&comanda.id, &soda_id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ItemNotFound);
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn adjust_by_zero_writes_nothing() {
    let h = memory_harness();
    let comanda = h.service.create(1).await.unwrap();
    let with_item = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(SODA))
        .await
        .unwrap();

    let same = h
        .service
        .adjust_quantity(&comanda.id, &with_item.items[0].id, 0)
        .await
        .unwrap();
    assert_eq!(same, with_item);
}

#[tokio::test]
async fn set_observation_replaces_and_clears() {
    let h = memory_harness();
    let comanda = h.service.create(1).await.unwrap();
    let with_item = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(SODA))
        .await
        .unwrap();
    let item_id = with_item.items[0].id.clone();

    let noted = h
        .service
        .set_observation(&comanda.id, &item_id, Some("bem gelado".to_string()))
        .await
        .unwrap();
    assert_eq!(noted.items[0].observation.as_deref(), Some("bem gelado"));
    assert_eq!(noted.total, with_item.total);

    let cleared = h
        .service
        .set_observation(&comanda.id, &item_id, Some(String::new()))
        .await
        .unwrap();
    assert!(cleared.items[0].observation.is_none());

    let err = h
        .service
        .set_observation(&comanda.id, "nope", None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ItemNotFound);

    let err = h
        .service
        .set_observation(&comanda.id, &item_id, Some("x".repeat(501)))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

// =============================================================================
// Lifecycle
// =============================================================================

async fn comanda_worth_28_50(service: &ComandaService) -> String {
    let comanda = service.create(7).await.unwrap();
    service
        .add_item(&comanda.id, AddItemRequest::new(SODA).quantity(3))
        .await
        .unwrap();
    comanda.id
}

#[tokio::test]
async fn cash_close_rejects_short_payment() {
    let h = memory_harness();
    let id = comanda_worth_28_50(&h.service).await;

    let err = h
        .service
        .close(&id, CloseRequest::cash(Money::from_cents(2000)))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CashInsufficient);
    assert_eq!(err.status(), 400);

    let err = h
        .service
        .close(
            &id,
            CloseRequest {
                payment_method: PaymentMethod::Cash,
                cash_paid: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CashInsufficient);

    let still_open = h.service.get(&id).await.unwrap();
    assert_eq!(still_open.status, ComandaStatus::Open);
    assert!(still_open.payment_method.is_none());
}

#[tokio::test]
async fn cash_close_computes_change() {
    let h = memory_harness();
    let id = comanda_worth_28_50(&h.service).await;

    let closed = h
        .service
        .close(&id, CloseRequest::cash(Money::from_cents(5000)))
        .await
        .unwrap();

    assert_eq!(closed.status, ComandaStatus::Closed);
    assert_eq!(closed.payment_method, Some(PaymentMethod::Cash));
    assert_eq!(closed.cash_paid, Some(Money::from_cents(5000)));
    assert_eq!(closed.change, Some(Money::from_cents(2150)));
    assert_eq!(closed.closed_at, Some(noon()));
    assert_eq!(h.service.get(&id).await.unwrap(), closed);
}

#[tokio::test]
async fn exact_cash_gives_zero_change() {
    let h = memory_harness();
    let id = comanda_worth_28_50(&h.service).await;

    let closed = h
        .service
        .close(&id, CloseRequest::cash(Money::from_cents(2850)))
        .await
        .unwrap();
    assert_eq!(closed.change, Some(Money::zero()));
}

#[tokio::test]
async fn pix_close_ignores_cash_amount() {
    let h = memory_harness();
    let id = comanda_worth_28_50(&h.service).await;

    let closed = h
        .service
        .close(
            &id,
            CloseRequest {
                payment_method: PaymentMethod::Pix,
                cash_paid: Some(Money::from_cents(9999)),
            },
        )
        .await
        .unwrap();

    assert_eq!(closed.payment_method, Some(PaymentMethod::Pix));
    assert!(closed.cash_paid.is_none());
    assert!(closed.change.is_none());
}

#[tokio::test]
async fn closed_comanda_is_frozen() {
    let h = memory_harness();
    let id = comanda_worth_28_50(&h.service).await;
    let closed = h.service.close(&id, CloseRequest::card()).await.unwrap();
    let item_id = closed.items[0].id.clone();

    let err = h.service.close(&id, CloseRequest::pix()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::AlreadyClosed);

    let err = h
        .service
        .add_item(&id, AddItemRequest::new(SODA))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ComandaClosed);

    let err = h
        .service
        .adjust_quantity(&id, &item_id, -1)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ComandaClosed);

    let err = h
        .service
        .set_observation(&id, &item_id, Some("late".to_string()))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ComandaClosed);

    assert_eq!(h.service.recalc(&id).await.unwrap(), closed);
}

#[tokio::test]
async fn empty_comanda_cannot_close() {
    let h = memory_harness();
    let comanda = h.service.create(3).await.unwrap();

    let err = h
        .service
        .close(&comanda.id, CloseRequest::pix())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EmptyComanda);

    // Emptied by quantity adjustments counts as empty too.
    let with_item = h
        .service
        .add_item(&comanda.id, AddItemRequest::new(SODA))
        .await
        .unwrap();
    h.service
        .adjust_quantity(&comanda.id, &with_item.items[0].id, -1)
        .await
        .unwrap();

    let err = h
        .service
        .close(&comanda.id, CloseRequest::card())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EmptyComanda);
}

#[tokio::test]
async fn close_unknown_comanda() {
    let h = memory_harness();
    let err = h.service.close("missing", CloseRequest::pix()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ComandaNotFound);
}

// =============================================================================
// Daily uniqueness
// =============================================================================

#[tokio::test]
async fn number_must_be_positive() {
    let h = memory_harness();

    for number in [0, -4] {
        let err = h.service.create(number).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
    assert_eq!(h.store.comanda_count(), 0);
}

#[tokio::test]
async fn number_is_unique_per_day_even_after_close() {
    let h = memory_harness();
    let id = comanda_worth_28_50(&h.service).await;
    h.service.close(&id, CloseRequest::pix()).await.unwrap();

    h.clock.advance(Duration::hours(11));
    let err = h.service.create(7).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NumberAlreadyExistsToday);
    assert_eq!(err.status(), 409);

    h.clock.advance(Duration::hours(1));
    let next_day = h.service.create(7).await.unwrap();
    assert_eq!(next_day.business_day.to_string(), "2026-10-19");
    assert_eq!(h.store.comanda_count(), 2);
}

#[tokio::test]
async fn business_day_follows_the_local_calendar() {
    // 02:30 UTC is still 23:30 of the previous day at UTC-3.
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 10, 18, 2, 30, 0).unwrap(),
        brt(),
    ));
    let h = memory_harness_with_clock(clock);

    let late = h.service.create(5).await.unwrap();
    assert_eq!(late.business_day.to_string(), "2026-10-17");

    // 03:00 UTC is local midnight: a new business day.
    h.clock.advance(Duration::minutes(30));
    let next = h.service.create(5).await.unwrap();
    assert_eq!(next.business_day.to_string(), "2026-10-18");

    let today: Vec<String> = h
        .service
        .list_today()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(today, vec![next.id]);
}

#[tokio::test]
async fn list_today_puts_open_first_then_newest() {
    let h = memory_harness();

    let first = h.service.create(1).await.unwrap();
    h.clock.advance(Duration::minutes(5));
    let second = comanda_worth_28_50(&h.service).await;
    h.clock.advance(Duration::minutes(5));
    let third = h.service.create(3).await.unwrap();
    h.service.close(&second, CloseRequest::card()).await.unwrap();

    let ids: Vec<String> = h
        .service
        .list_today()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.id)
        .collect();
    assert_eq!(ids, vec![third.id, first.id, second]);
}

#[tokio::test]
async fn recalc_returns_consistent_totals() {
    let h = memory_harness();
    let comanda = h.service.create(1).await.unwrap();
    h.service
        .add_item(&comanda.id, AddItemRequest::new(SODA).quantity(2))
        .await
        .unwrap();
    h.service
        .add_item(&comanda.id, AddItemRequest::new(BUFFET).weight_grams(500))
        .await
        .unwrap();

    let recalculated = h.service.recalc(&comanda.id).await.unwrap();
    assert_eq!(recalculated.total, Money::from_cents(2 * 950 + 2000));
    assert_eq!(recalculated.items_count, 3);

    let err = h.service.recalc("missing").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ComandaNotFound);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_adds_are_all_counted() {
    const N: i64 = 64;

    let h = memory_harness();
    let service = Arc::new(h.service);
    let comanda = service.create(1).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..N {
        let service = Arc::clone(&service);
        let id = comanda.id.clone();
        handles.push(tokio::spawn(async move {
            let request = if i % 2 == 0 {
                AddItemRequest::new(SODA)
            } else {
                AddItemRequest::new(BUFFET).weight_grams(100)
            };
            service.add_item(&id, request).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let result = service.get(&comanda.id).await.unwrap();
    assert_eq!(result.items_count, N);
    assert_eq!(result.items.len() as i64, 1 + N / 2);
    assert_eq!(
        result.total,
        Money::from_cents((N / 2) * 950 + (N / 2) * 400)
    );
    assert_eq!(result.version, N);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn writers_without_a_shared_lock_are_reconciled_by_versions() {
    const PER_SERVICE: i64 = 25;

    // Two services over one store behave like two processes over one
    // database: their lock registries are independent.
    let h = memory_harness();
    let other = ComandaService::new(h.store.clone(), h.store.clone(), h.clock.clone())
        .with_max_conflict_retries(1_000);
    let services = [
        Arc::new(h.service.with_max_conflict_retries(1_000)),
        Arc::new(other),
    ];
    let comanda = services[0].create(1).await.unwrap();

    let mut handles = Vec::new();
    for service in &services {
        for _ in 0..PER_SERVICE {
            let service = Arc::clone(service);
            let id = comanda.id.clone();
            handles.push(tokio::spawn(async move {
                service.add_item(&id, AddItemRequest::new(SODA)).await
            }));
        }
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let result = services[1].get(&comanda.id).await.unwrap();
    assert_eq!(result.items_count, 2 * PER_SERVICE);
    assert_eq!(result.total, Money::from_cents(2 * PER_SERVICE * 950));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_closes_have_one_winner() {
    let h = memory_harness();
    let service = Arc::new(h.service);
    let id = comanda_worth_28_50(&service).await;

    let a = {
        let service = Arc::clone(&service);
        let id = id.clone();
        tokio::spawn(async move { service.close(&id, CloseRequest::pix()).await })
    };
    let b = {
        let service = Arc::clone(&service);
        let id = id.clone();
        tokio::spawn(async move { service.close(&id, CloseRequest::card()).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    let losers: Vec<ErrorCode> = results
        .iter()
        .filter_map(|r| r.as_ref().err().map(|e| e.code))
        .collect();

    assert_eq!(winners, 1);
    assert_eq!(losers, vec![ErrorCode::AlreadyClosed]);
}
