//! PostgreSQLアダプタのテスト
//!
//! 実行には PostgreSQL が必要：
//! `DATABASE_URL=postgres://... cargo test -- --ignored`

mod common;

use chrono::{DateTime, Duration, Utc};
use library_reservations::adapters::postgres::{
    PostgresBookStore, PostgresLibCardStore, PostgresReaderStore, PostgresReservationStore,
    PostgresUnitOfWork,
};
use library_reservations::application::reservation::{
    ReservationError, ServiceDependencies, close_reservation, create_reservation,
    detect_expired_reservations,
};
use library_reservations::config::ReservationPolicy;
use library_reservations::domain::commands::{CloseReservation, CreateReservation};
use library_reservations::domain::reservation::{self, Reservation};
use library_reservations::domain::*;
use library_reservations::ports::*;
use serial_test::serial;
use sqlx::PgPool;
use std::sync::Arc;

/// PostgreSQLの時刻精度（マイクロ秒）に合わせて丸める
fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(dt.timestamp_micros()).expect("Invalid timestamp")
}

fn deps_for(pool: &PgPool) -> ServiceDependencies {
    ServiceDependencies {
        reservation_store: Arc::new(PostgresReservationStore::new(pool.clone())),
        book_store: Arc::new(PostgresBookStore::new(pool.clone())),
        reader_store: Arc::new(PostgresReaderStore::new(pool.clone())),
        lib_card_store: Arc::new(PostgresLibCardStore::new(pool.clone())),
        unit_of_work: Arc::new(PostgresUnitOfWork::new(pool.clone())),
        policy: ReservationPolicy::default(),
    }
}

/// テストデータをクリーンアップ
async fn cleanup(pool: &PgPool) {
    for table in ["reservations", "lib_cards", "books", "readers"] {
        sqlx::query(&format!("DELETE FROM {}", table))
            .execute(pool)
            .await
            .expect("Failed to cleanup test data");
    }
}

async fn seed_reader(pool: &PgPool, age: u32) -> ReaderId {
    let reader = Reader {
        id: ReaderId::new(),
        full_name: "Test Reader".to_string(),
        phone_number: "+10000000000".to_string(),
        age,
    };
    PostgresReaderStore::new(pool.clone())
        .create(&reader)
        .await
        .expect("Failed to create reader");

    let lib_card = LibCard {
        id: LibCardId::new(),
        reader_id: reader.id,
        number: "LC-0001".to_string(),
        validity_days: 365,
        issue_date: truncate_to_micros(Utc::now()),
        action_status: true,
    };
    PostgresLibCardStore::new(pool.clone())
        .create(&lib_card)
        .await
        .expect("Failed to create lib card");

    reader.id
}

async fn seed_book(pool: &PgPool, copies_number: u32, rarity: Rarity) -> Book {
    let book = Book {
        id: BookId::new(),
        title: "Test Book".to_string(),
        author: "Author".to_string(),
        publisher: "Publisher".to_string(),
        copies_number,
        rarity,
        genre: "novel".to_string(),
        publishing_year: 1999,
        language: "en".to_string(),
        age_limit: 0,
    };
    PostgresBookStore::new(pool.clone())
        .create(&book)
        .await
        .expect("Failed to create book");
    book
}

/// 貸出期間14日の予約を発行する
fn issue_at(reader_id: ReaderId, book_id: BookId, at: DateTime<Utc>) -> Reservation {
    reservation::issue(reader_id, book_id, at, Duration::days(14))
        .expect("Failed to issue reservation")
}

async fn copies_of(pool: &PgPool, book_id: BookId) -> u32 {
    PostgresBookStore::new(pool.clone())
        .get_by_id(book_id)
        .await
        .expect("Failed to get book")
        .expect("Book not found")
        .copies_number
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_book_and_lib_card_round_trip() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;

    let book = seed_book(&pool, 4, Rarity::Rare).await;
    let stored = PostgresBookStore::new(pool.clone())
        .get_by_id(book.id)
        .await
        .expect("Failed to get book");
    assert_eq!(stored, Some(book));

    let reader_id = seed_reader(&pool, 40).await;
    let lib_card_store = PostgresLibCardStore::new(pool.clone());
    let mut lib_card = lib_card_store
        .get_by_reader_id(reader_id)
        .await
        .expect("Failed to get lib card")
        .expect("Lib card not found");
    assert!(lib_card.action_status);

    lib_card.action_status = false;
    lib_card_store
        .update(&lib_card)
        .await
        .expect("Failed to update lib card");
    let updated = lib_card_store
        .get_by_reader_id(reader_id)
        .await
        .expect("Failed to get lib card");
    assert_eq!(updated, Some(lib_card));

    cleanup(&pool).await;
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_reservation_store_queries() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let store = PostgresReservationStore::new(pool.clone());

    let reader_id = seed_reader(&pool, 30).await;
    let book = seed_book(&pool, 3, Rarity::Common).await;
    let now = truncate_to_micros(Utc::now());

    let active = issue_at(reader_id, book.id, now);
    let overdue = issue_at(reader_id, book.id, now - Duration::days(20));
    let closed = reservation::close(
        &issue_at(reader_id, book.id, now - Duration::days(30)),
        now - Duration::days(10),
    )
    .expect("Failed to close reservation");

    for r in [&active, &overdue, &closed] {
        store.create(r).await.expect("Failed to create reservation");
    }

    // Assert: 状態ごとの検索
    let fetched = store.get_by_id(active.id).await.expect("Failed to get");
    assert_eq!(fetched, Some(active.clone()));

    let active_ids: Vec<ReservationId> = store
        .get_active_by_reader_id(reader_id)
        .await
        .expect("Failed to get active")
        .iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(active_ids, vec![active.id, overdue.id]);

    let expired = store
        .get_expired_by_reader_id(reader_id, now)
        .await
        .expect("Failed to get expired");
    assert_eq!(expired, vec![overdue.clone()]);

    let past_due = store.find_past_due(now).await.expect("Failed to find past due");
    assert_eq!(past_due, vec![overdue.clone()]);

    let all = store
        .get_by_reader_id(reader_id)
        .await
        .expect("Failed to get by reader");
    assert_eq!(all.len(), 3);
    assert_eq!(store.get_by_book_id(book.id).await.unwrap().len(), 3);

    cleanup(&pool).await;
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_duplicate_reservation_is_reported() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let store = PostgresReservationStore::new(pool.clone());

    let reader_id = seed_reader(&pool, 30).await;
    let book = seed_book(&pool, 1, Rarity::Common).await;
    let r = issue_at(reader_id, book.id, truncate_to_micros(Utc::now()));

    store.create(&r).await.expect("Failed to create reservation");
    let err = store.create(&r).await.unwrap_err();

    let duplicate = err
        .downcast::<DuplicateReservation>()
        .expect("Expected DuplicateReservation");
    assert_eq!(duplicate.0, r.id);

    cleanup(&pool).await;
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_dropped_transaction_rolls_back() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let unit_of_work = PostgresUnitOfWork::new(pool.clone());

    let reader_id = seed_reader(&pool, 30).await;
    let book = seed_book(&pool, 2, Rarity::Common).await;
    let r: Reservation = issue_at(reader_id, book.id, truncate_to_micros(Utc::now()));

    // Act: コミットせずにスコープを捨てる
    {
        let mut scope = unit_of_work.begin().await.expect("Failed to begin");
        scope
            .insert_reservation(&r)
            .await
            .expect("Failed to insert reservation");
        let locked = scope
            .lock_book(book.id)
            .await
            .expect("Failed to lock book")
            .expect("Book not found");
        scope
            .update_book(&locked.take_copy().expect("No copies"))
            .await
            .expect("Failed to update book");
    }

    // Assert
    let store = PostgresReservationStore::new(pool.clone());
    assert_eq!(store.get_by_id(r.id).await.expect("Failed to get"), None);
    assert_eq!(copies_of(&pool, book.id).await, 2);

    cleanup(&pool).await;
}

#[tokio::test]
#[ignore]
#[serial]
async fn test_reservation_lifecycle_on_postgres() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let deps = deps_for(&pool);

    let reader_id = seed_reader(&pool, 30).await;
    let book = seed_book(&pool, 1, Rarity::Common).await;
    let now = truncate_to_micros(Utc::now());

    // 予約作成で在庫が減る
    let reservation_id = create_reservation(
        &deps,
        CreateReservation {
            reader_id,
            book_id: book.id,
            requested_at: now,
        },
    )
    .await
    .expect("Failed to create reservation");
    assert_eq!(copies_of(&pool, book.id).await, 0);

    // 在庫切れ
    let other_reader = seed_reader(&pool, 30).await;
    let err = create_reservation(
        &deps,
        CreateReservation {
            reader_id: other_reader,
            book_id: book.id,
            requested_at: now,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ReservationError::NoCopiesAvailable));

    // 期限切れ検知
    let expired = detect_expired_reservations(&deps, now + Duration::days(15))
        .await
        .expect("Failed to detect expired");
    assert_eq!(expired, 1);

    // 返却で在庫が戻る
    close_reservation(
        &deps,
        CloseReservation {
            reservation_id,
            closed_at: now + Duration::days(16),
        },
    )
    .await
    .expect("Failed to close reservation");
    assert_eq!(copies_of(&pool, book.id).await, 1);

    cleanup(&pool).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
#[serial]
async fn test_concurrent_reservations_on_postgres() {
    let pool = common::create_test_pool().await;
    cleanup(&pool).await;
    let deps = deps_for(&pool);

    let book = seed_book(&pool, 2, Rarity::Common).await;
    let now = truncate_to_micros(Utc::now());
    let mut readers = Vec::new();
    for _ in 0..6 {
        readers.push(seed_reader(&pool, 30).await);
    }

    let results = futures::future::join_all(readers.iter().map(|reader_id| {
        create_reservation(
            &deps,
            CreateReservation {
                reader_id: *reader_id,
                book_id: book.id,
                requested_at: now,
            },
        )
    }))
    .await;

    // 行ロックにより在庫を超えて予約されない
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 2);
    assert!(
        results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|err| matches!(err, ReservationError::NoCopiesAvailable))
    );
    assert_eq!(copies_of(&pool, book.id).await, 0);

    cleanup(&pool).await;
}
