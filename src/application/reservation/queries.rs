use crate::domain::{BookId, ReaderId, ReservationId, reservation::Reservation};

use super::errors::{ReservationError, Result};
use super::reservation_service::{ServiceDependencies, load_reservation};

/// IDで予約を取得する
pub async fn get_reservation(
    deps: &ServiceDependencies,
    reservation_id: ReservationId,
) -> Result<Reservation> {
    load_reservation(deps, reservation_id).await
}

/// 読者の全予約を取得する（返却済みを含む）
pub async fn list_reservations_by_reader(
    deps: &ServiceDependencies,
    reader_id: ReaderId,
) -> Result<Vec<Reservation>> {
    deps.reservation_store
        .get_by_reader_id(reader_id)
        .await
        .map_err(ReservationError::ReservationStoreError)
}

/// 書籍の全予約を取得する
///
/// 管理者による貸出状況の確認に使用される。
pub async fn list_reservations_by_book(
    deps: &ServiceDependencies,
    book_id: BookId,
) -> Result<Vec<Reservation>> {
    deps.reservation_store
        .get_by_book_id(book_id)
        .await
        .map_err(ReservationError::ReservationStoreError)
}
