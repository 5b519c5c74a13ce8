use std::sync::Arc;

use booking_backend::application::BookingError;
use chrono::{Duration, Utc};
use serial_test::serial;

mod common;

// ============================================================================
// 予約トランザクションの統合テスト（実データベース使用）
// ============================================================================

#[tokio::test]
#[serial]
async fn test_book_item_success_scenario() {
    // Arrange: 残数1・期限1年後のアイテムと予約数0の会員
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    let member_id = common::insert_member(&pool, "John", "Doe", 0).await;
    let item_id = common::insert_item(&pool, "Widget", 1, Utc::now() + Duration::days(365)).await;

    let service = common::booking_service(&pool, 2);

    // Act
    let booking = service
        .book_item("John", "Doe", "Widget")
        .await
        .expect("booking should succeed");

    // Assert: 参照が採番され、両カウンタが動いている
    assert!(!booking.reference.to_string().is_empty());
    assert_eq!(booking.member_id, member_id);
    assert_eq!(booking.inventory_id, item_id);
    assert_eq!(common::item_remaining_count(&pool, item_id).await, 0);
    assert_eq!(common::member_booking_count(&pool, member_id).await, 1);
    assert!(common::booking_exists(&pool, booking.reference.value()).await);
}

#[tokio::test]
#[serial]
async fn test_book_item_member_not_found() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    common::insert_item(&pool, "Widget", 1, Utc::now() + Duration::days(365)).await;
    let service = common::booking_service(&pool, 2);

    let result = service.book_item("Nobody", "Unknown", "Widget").await;

    assert!(matches!(result, Err(BookingError::MemberNotFound)));
    assert_eq!(common::count_bookings(&pool).await, 0);
}

#[tokio::test]
#[serial]
async fn test_book_item_limit_exceeded_leaves_store_untouched() {
    // Arrange: 既に上限いっぱいの会員
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    let member_id = common::insert_member(&pool, "John", "Doe", 2).await;
    let item_id = common::insert_item(&pool, "Widget", 3, Utc::now() + Duration::days(365)).await;

    let service = common::booking_service(&pool, 2);

    // Act
    let result = service.book_item("John", "Doe", "Widget").await;

    // Assert: エラー種別が正しく、ストアは一切変化していない
    assert!(matches!(
        result,
        Err(BookingError::MemberLimitExceeded { limit: 2 })
    ));
    assert_eq!(common::item_remaining_count(&pool, item_id).await, 3);
    assert_eq!(common::member_booking_count(&pool, member_id).await, 2);
    assert_eq!(common::count_bookings(&pool).await, 0);
}

#[tokio::test]
#[serial]
async fn test_book_item_item_not_found() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    common::insert_member(&pool, "John", "Doe", 0).await;
    let service = common::booking_service(&pool, 2);

    let result = service.book_item("John", "Doe", "Nothing").await;

    assert!(matches!(result, Err(BookingError::ItemNotFound)));
}

#[tokio::test]
#[serial]
async fn test_book_item_expired_is_checked_before_depleted() {
    // Arrange: 期限切れかつ残数ゼロのアイテム
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    common::insert_member(&pool, "John", "Doe", 0).await;
    common::insert_item(&pool, "Stale", 0, Utc::now() - Duration::days(1)).await;

    let service = common::booking_service(&pool, 2);

    // Act / Assert: 先に期限検査が走るのでItemExpiredになる
    let result = service.book_item("John", "Doe", "Stale").await;
    assert!(matches!(result, Err(BookingError::ItemExpired)));
}

#[tokio::test]
#[serial]
async fn test_book_item_depleted_leaves_store_untouched() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    let member_id = common::insert_member(&pool, "John", "Doe", 0).await;
    let item_id = common::insert_item(&pool, "Gone", 0, Utc::now() + Duration::days(365)).await;

    let service = common::booking_service(&pool, 2);

    let result = service.book_item("John", "Doe", "Gone").await;

    assert!(matches!(result, Err(BookingError::ItemDepleted)));
    assert_eq!(common::item_remaining_count(&pool, item_id).await, 0);
    assert_eq!(common::member_booking_count(&pool, member_id).await, 0);
    assert_eq!(common::count_bookings(&pool).await, 0);
}

#[tokio::test]
#[serial]
async fn test_book_then_cancel_restores_counts() {
    // Arrange
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    let member_id = common::insert_member(&pool, "John", "Doe", 0).await;
    let item_id = common::insert_item(&pool, "Widget", 5, Utc::now() + Duration::days(365)).await;

    let service = common::booking_service(&pool, 2);

    // Act: 予約してからキャンセル
    let booking = service
        .book_item("John", "Doe", "Widget")
        .await
        .expect("booking should succeed");
    service
        .cancel_booking("John", "Doe", &booking.reference.to_string())
        .await
        .expect("cancellation should succeed");

    // Assert: 予約前の状態に戻り、予約行は消えている
    assert_eq!(common::item_remaining_count(&pool, item_id).await, 5);
    assert_eq!(common::member_booking_count(&pool, member_id).await, 0);
    assert!(!common::booking_exists(&pool, booking.reference.value()).await);
}

#[tokio::test]
#[serial]
async fn test_cancel_twice_fails_and_never_double_increments() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    let member_id = common::insert_member(&pool, "John", "Doe", 0).await;
    let item_id = common::insert_item(&pool, "Widget", 1, Utc::now() + Duration::days(365)).await;

    let service = common::booking_service(&pool, 2);

    let booking = service
        .book_item("John", "Doe", "Widget")
        .await
        .expect("booking should succeed");
    let reference = booking.reference.to_string();

    service
        .cancel_booking("John", "Doe", &reference)
        .await
        .expect("first cancellation should succeed");

    // Act: 同じ参照で二度目のキャンセル
    let second = service.cancel_booking("John", "Doe", &reference).await;

    // Assert: BookingNotFoundで失敗し、カウンタは二重に戻らない
    assert!(matches!(second, Err(BookingError::BookingNotFound)));
    assert_eq!(common::item_remaining_count(&pool, item_id).await, 1);
    assert_eq!(common::member_booking_count(&pool, member_id).await, 0);
}

#[tokio::test]
#[serial]
async fn test_cancel_member_not_found_checked_first() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    let service = common::booking_service(&pool, 2);

    // 会員検査が予約検査より先に走る
    let result = service
        .cancel_booking("Nobody", "Unknown", "not-even-a-reference")
        .await;
    assert!(matches!(result, Err(BookingError::MemberNotFound)));
}

#[tokio::test]
#[serial]
async fn test_cancel_malformed_reference_is_not_found() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    common::insert_member(&pool, "John", "Doe", 0).await;
    let service = common::booking_service(&pool, 2);

    let result = service.cancel_booking("John", "Doe", "garbage").await;
    assert!(matches!(result, Err(BookingError::BookingNotFound)));
}

#[tokio::test]
#[serial]
async fn test_cancel_survives_orphaned_inventory_row() {
    // Arrange: 予約後に在庫行を独立に削除する
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    let member_id = common::insert_member(&pool, "John", "Doe", 0).await;
    let item_id = common::insert_item(&pool, "Widget", 1, Utc::now() + Duration::days(365)).await;

    let service = common::booking_service(&pool, 2);
    let booking = service
        .book_item("John", "Doe", "Widget")
        .await
        .expect("booking should succeed");

    sqlx::query("DELETE FROM inventory WHERE id = $1")
        .bind(item_id.value())
        .execute(&pool)
        .await
        .expect("Failed to delete inventory row");

    // Act: 孤児になった予約をキャンセル
    service
        .cancel_booking("John", "Doe", &booking.reference.to_string())
        .await
        .expect("cancellation of an orphaned booking should succeed");

    // Assert: 会員カウンタだけが戻り、予約行は消えている
    assert_eq!(common::member_booking_count(&pool, member_id).await, 0);
    assert_eq!(common::count_bookings(&pool).await, 0);
}

#[tokio::test]
#[serial]
async fn test_concurrent_bookings_on_last_unit_serialize() {
    // Arrange: 残数1のアイテムと2人の会員
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    common::insert_member(&pool, "Alice", "One", 0).await;
    common::insert_member(&pool, "Bob", "Two", 0).await;
    let item_id = common::insert_item(&pool, "Solo", 1, Utc::now() + Duration::days(30)).await;

    let service = Arc::new(common::booking_service(&pool, 2));

    // Act: 同じアイテムへ同時に予約をかける
    let first = {
        let service = service.clone();
        tokio::spawn(async move { service.book_item("Alice", "One", "Solo").await })
    };
    let second = {
        let service = service.clone();
        tokio::spawn(async move { service.book_item("Bob", "Two", "Solo").await })
    };

    let results = [
        first.await.expect("task panicked"),
        second.await.expect("task panicked"),
    ];

    // Assert: 行ロックにより直列化され、成功はちょうど1件
    let successes = results.iter().filter(|result| result.is_ok()).count();
    assert_eq!(successes, 1);
    assert!(
        results
            .iter()
            .any(|result| matches!(result, Err(BookingError::ItemDepleted)))
    );
    assert_eq!(common::item_remaining_count(&pool, item_id).await, 0);
    assert_eq!(common::count_bookings(&pool).await, 1);
}

#[tokio::test]
#[serial]
async fn test_booking_references_are_unique_per_booking() {
    let pool = common::create_test_pool().await;
    common::cleanup_database(&pool).await;

    common::insert_member(&pool, "John", "Doe", 0).await;
    common::insert_item(&pool, "Widget", 2, Utc::now() + Duration::days(365)).await;

    let service = common::booking_service(&pool, 2);

    let first = service.book_item("John", "Doe", "Widget").await.unwrap();
    let second = service.book_item("John", "Doe", "Widget").await.unwrap();

    assert_ne!(first.reference, second.reference);

    let all = service.list_all_bookings().await.unwrap();
    assert_eq!(all.len(), 2);
}
