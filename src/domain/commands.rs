use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, ReaderId, ReservationId, reservation::Reservation};

/// コマンド：書籍を予約する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateReservation {
    pub reader_id: ReaderId,
    pub book_id: BookId,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：予約を延長する
///
/// extra_days が`None`の場合はポリシーの延長期間を使う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenewReservation {
    pub reservation: Reservation,
    pub extra_days: Option<u32>,
    pub renewed_at: DateTime<Utc>,
}

/// コマンド：書籍を返却する（予約を閉じる）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseReservation {
    pub reservation_id: ReservationId,
    pub closed_at: DateTime<Utc>,
}
