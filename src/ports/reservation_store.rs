use crate::domain::{BookId, ReaderId, ReservationId, reservation::Reservation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 同じIDの予約が既に存在する
///
/// `create`/`insert_reservation`はこのエラーを返し、
/// アプリケーション層が AlreadyExists として区別できるようにする。
#[derive(Debug, Error)]
#[error("Reservation {0} already exists")]
pub struct DuplicateReservation(pub ReservationId);

/// 予約ストアポート
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// 予約を保存する
    async fn create(&self, reservation: &Reservation) -> Result<()>;

    /// 予約を更新する
    async fn update(&self, reservation: &Reservation) -> Result<()>;

    /// IDで予約を取得する
    async fn get_by_id(&self, reservation_id: ReservationId) -> Result<Option<Reservation>>;

    /// 読者の有効な予約（Issued, Extended）を取得する
    ///
    /// 予約上限の確認に使用される。
    async fn get_active_by_reader_id(&self, reader_id: ReaderId) -> Result<Vec<Reservation>>;

    /// 読者の返却期限切れの予約を取得する
    ///
    /// return_date < now かつ Closed 以外の予約を返す。
    async fn get_expired_by_reader_id(
        &self,
        reader_id: ReaderId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reservation>>;

    /// 書籍の全予約を取得する
    async fn get_by_book_id(&self, book_id: BookId) -> Result<Vec<Reservation>>;

    /// 読者の全予約を取得する（履歴表示用）
    async fn get_by_reader_id(&self, reader_id: ReaderId) -> Result<Vec<Reservation>>;

    /// 期限切れ候補を検索する
    ///
    /// return_date < cutoff かつ Issued, Extended の予約を返す。
    /// 期限切れ検知バッチで使用される。
    async fn find_past_due(&self, cutoff: DateTime<Utc>) -> Result<Vec<Reservation>>;
}
