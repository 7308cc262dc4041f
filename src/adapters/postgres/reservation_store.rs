use crate::domain::{BookId, ReaderId, ReservationId, ReservationState, reservation::Reservation};
use crate::ports::reservation_store::{
    DuplicateReservation, ReservationStore as ReservationStoreTrait, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

/// PostgreSQLの行データをReservationに変換する
fn map_row_to_reservation(row: &PgRow) -> Result<Reservation> {
    let state_str: &str = row.get("state");
    let state = ReservationState::from_str(state_str).map_err(invalid_data)?;

    Ok(Reservation {
        id: ReservationId::from_uuid(row.get("id")),
        reader_id: ReaderId::from_uuid(row.get("reader_id")),
        book_id: BookId::from_uuid(row.get("book_id")),
        issue_date: row.get("issue_date"),
        return_date: row.get("return_date"),
        state,
    })
}

/// 予約を取得する
///
/// `for_update`が真の場合は行ロックを取る。
pub(super) async fn select_reservation<'c, E>(
    executor: E,
    reservation_id: ReservationId,
    for_update: bool,
) -> Result<Option<Reservation>>
where
    E: PgExecutor<'c>,
{
    let sql = if for_update {
        r#"
        SELECT id, reader_id, book_id, issue_date, return_date, state
        FROM reservations
        WHERE id = $1
        FOR UPDATE
        "#
    } else {
        r#"
        SELECT id, reader_id, book_id, issue_date, return_date, state
        FROM reservations
        WHERE id = $1
        "#
    };

    let row = sqlx::query(sql)
        .bind(reservation_id.value())
        .fetch_optional(executor)
        .await?;

    row.as_ref().map(map_row_to_reservation).transpose()
}

/// 予約を保存する
///
/// 主キー重複は`DuplicateReservation`として返す。
pub(super) async fn insert_reservation<'c, E>(executor: E, reservation: &Reservation) -> Result<()>
where
    E: PgExecutor<'c>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO reservations (id, reader_id, book_id, issue_date, return_date, state)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(reservation.id.value())
    .bind(reservation.reader_id.value())
    .bind(reservation.book_id.value())
    .bind(reservation.issue_date)
    .bind(reservation.return_date)
    .bind(reservation.state.as_str())
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(Box::new(DuplicateReservation(reservation.id)))
        }
        Err(err) => Err(err.into()),
    }
}

/// 予約を更新する
pub(super) async fn update_reservation<'c, E>(executor: E, reservation: &Reservation) -> Result<()>
where
    E: PgExecutor<'c>,
{
    let result = sqlx::query(
        r#"
        UPDATE reservations
        SET issue_date = $2, return_date = $3, state = $4
        WHERE id = $1
        "#,
    )
    .bind(reservation.id.value())
    .bind(reservation.issue_date)
    .bind(reservation.return_date)
    .bind(reservation.state.as_str())
    .execute(executor)
    .await?;

    if result.rows_affected() < 1 {
        return Err(invalid_data(format!(
            "reservation {} does not exist",
            reservation.id
        )));
    }
    Ok(())
}

/// ReservationStoreのPostgreSQL実装
///
/// (reader_id, state) と有効な予約の return_date にインデックスがある。
pub struct ReservationStore {
    pool: PgPool,
}

impl ReservationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationStoreTrait for ReservationStore {
    async fn create(&self, reservation: &Reservation) -> Result<()> {
        insert_reservation(&self.pool, reservation).await
    }

    async fn update(&self, reservation: &Reservation) -> Result<()> {
        update_reservation(&self.pool, reservation).await
    }

    async fn get_by_id(&self, reservation_id: ReservationId) -> Result<Option<Reservation>> {
        select_reservation(&self.pool, reservation_id, false).await
    }

    /// 読者の有効な予約を取得（予約上限確認用）
    async fn get_active_by_reader_id(&self, reader_id: ReaderId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, reader_id, book_id, issue_date, return_date, state
            FROM reservations
            WHERE reader_id = $1 AND state IN ('issued', 'extended')
            ORDER BY issue_date DESC
            "#,
        )
        .bind(reader_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_reservation).collect()
    }

    /// 読者の返却期限切れの予約を取得（Expired を含む、Closed を除く）
    async fn get_expired_by_reader_id(
        &self,
        reader_id: ReaderId,
        now: DateTime<Utc>,
    ) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, reader_id, book_id, issue_date, return_date, state
            FROM reservations
            WHERE reader_id = $1 AND return_date < $2 AND state <> 'closed'
            ORDER BY issue_date DESC
            "#,
        )
        .bind(reader_id.value())
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_reservation).collect()
    }

    async fn get_by_book_id(&self, book_id: BookId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, reader_id, book_id, issue_date, return_date, state
            FROM reservations
            WHERE book_id = $1
            ORDER BY issue_date DESC
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_reservation).collect()
    }

    async fn get_by_reader_id(&self, reader_id: ReaderId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, reader_id, book_id, issue_date, return_date, state
            FROM reservations
            WHERE reader_id = $1
            ORDER BY issue_date DESC
            "#,
        )
        .bind(reader_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_reservation).collect()
    }

    /// 期限切れ候補を検索（バッチ期限切れ検知用）
    async fn find_past_due(&self, cutoff: DateTime<Utc>) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, reader_id, book_id, issue_date, return_date, state
            FROM reservations
            WHERE state IN ('issued', 'extended') AND return_date < $1
            ORDER BY return_date ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_reservation).collect()
    }
}
