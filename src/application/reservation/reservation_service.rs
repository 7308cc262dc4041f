use crate::config::ReservationPolicy;
use crate::domain::{
    self, Book, BookId, ReaderId, Reader, ReservationId, ReservationState, RenewalError,
    commands::*, reservation::Reservation,
};
use crate::ports::*;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::errors::{ReservationError, Result};

/// サービスの依存関係
///
/// 関数型DDDの原則に従い、データ構造として定義。
/// ポリシー（上限・期間）もここで明示的に渡す。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub reservation_store: Arc<dyn ReservationStore>,
    pub book_store: Arc<dyn BookStore>,
    pub reader_store: Arc<dyn ReaderStore>,
    pub lib_card_store: Arc<dyn LibCardStore>,
    pub unit_of_work: Arc<dyn UnitOfWork>,
    pub policy: ReservationPolicy,
}

async fn load_reader(deps: &ServiceDependencies, reader_id: ReaderId) -> Result<Reader> {
    deps.reader_store
        .get_by_id(reader_id)
        .await
        .map_err(ReservationError::ReaderStoreError)?
        .ok_or(ReservationError::ReaderNotFound)
}

async fn load_book(deps: &ServiceDependencies, book_id: BookId) -> Result<Book> {
    deps.book_store
        .get_by_id(book_id)
        .await
        .map_err(ReservationError::BookStoreError)?
        .ok_or(ReservationError::BookNotFound)
}

pub(super) async fn load_reservation(
    deps: &ServiceDependencies,
    reservation_id: ReservationId,
) -> Result<Reservation> {
    deps.reservation_store
        .get_by_id(reservation_id)
        .await
        .map_err(ReservationError::ReservationStoreError)?
        .ok_or(ReservationError::ReservationNotFound)
}

/// 返却期限切れの予約がないことを確認する
async fn check_no_expired_books(
    deps: &ServiceDependencies,
    reader_id: ReaderId,
    now: DateTime<Utc>,
) -> Result<()> {
    let expired = deps
        .reservation_store
        .get_expired_by_reader_id(reader_id, now)
        .await
        .map_err(ReservationError::ReservationStoreError)?;

    if !expired.is_empty() {
        tracing::debug!(count = expired.len(), "reader has expired books");
        return Err(ReservationError::HasExpiredBooks);
    }
    Ok(())
}

/// 有効な予約数が上限未満であることを確認する
async fn check_active_limit(deps: &ServiceDependencies, reader_id: ReaderId) -> Result<()> {
    let active = deps
        .reservation_store
        .get_active_by_reader_id(reader_id)
        .await
        .map_err(ReservationError::ReservationStoreError)?;

    let limit = deps.policy.max_active_reservations;
    if active.len() >= limit {
        tracing::debug!(active = active.len(), limit, "active reservation limit reached");
        return Err(ReservationError::ActiveLimitExceeded(limit));
    }
    Ok(())
}

/// 図書カードが存在し、有効であることを確認する
///
/// 有効期限による失効は図書カード側で action_status に反映済み。
async fn check_valid_lib_card(deps: &ServiceDependencies, reader_id: ReaderId) -> Result<()> {
    let lib_card = deps
        .lib_card_store
        .get_by_reader_id(reader_id)
        .await
        .map_err(ReservationError::LibCardStoreError)?
        .ok_or(ReservationError::LibCardMissing)?;

    if !lib_card.action_status {
        tracing::debug!(lib_card_id = %lib_card.id.value(), "library card is not active");
        return Err(ReservationError::LibCardInvalid);
    }
    Ok(())
}

/// 予約の書き込みエラーを変換する
///
/// ID重複だけを AlreadyExists として区別し、それ以外はそのまま包む。
pub(super) fn map_reservation_write_error(
    err: Box<dyn std::error::Error + Send + Sync>,
) -> ReservationError {
    match err.downcast::<DuplicateReservation>() {
        Ok(duplicate) => ReservationError::ReservationAlreadyExists(duplicate.0),
        Err(err) => ReservationError::ReservationStoreError(err),
    }
}

/// トランザクション内：書籍の在庫を1冊減らし、予約を保存する
///
/// 書籍はロック付きで再取得する。資格チェック後に在庫が0になっていれば
/// NoCopiesAvailable でロールバックする。書籍のロックは予約の挿入より先に取る。
async fn persist_new_reservation(
    scope: &mut dyn TransactionScope,
    reservation: Reservation,
) -> Result<()> {
    let book = scope
        .lock_book(reservation.book_id)
        .await
        .map_err(ReservationError::BookStoreError)?
        .ok_or(ReservationError::BookNotFound)?;

    let book = book
        .take_copy()
        .ok_or(ReservationError::NoCopiesAvailable)?;

    scope
        .insert_reservation(&reservation)
        .await
        .map_err(map_reservation_write_error)?;

    scope
        .update_book(&book)
        .await
        .map_err(ReservationError::BookStoreError)?;

    Ok(())
}

/// 書籍を予約する（純粋な関数）
///
/// ビジネスルール（この順に確認し、最初の違反で失敗する）：
/// 1. 読者が存在すること
/// 2. 返却期限切れの予約がないこと
/// 3. 有効な予約が上限未満であること
/// 4. 有効な図書カードがあること
/// 5. 書籍が存在すること
/// 6. 在庫があること
/// 7. Unique の書籍でないこと
/// 8. 読者の年齢が書籍の年齢制限以上であること
///
/// # 一貫性保証
///
/// 予約の保存と在庫の減算は1つのトランザクションで実行される。
/// どちらかが失敗すれば両方ともロールバックされ、エラーはそのまま返る。
///
/// # 戻り値
/// 成功時は作成された予約のID
#[tracing::instrument(skip(deps))]
pub async fn create_reservation(
    deps: &ServiceDependencies,
    cmd: CreateReservation,
) -> Result<ReservationId> {
    let reader = load_reader(deps, cmd.reader_id).await?;
    check_no_expired_books(deps, reader.id, cmd.requested_at).await?;
    check_active_limit(deps, reader.id).await?;
    check_valid_lib_card(deps, reader.id).await?;

    let book = load_book(deps, cmd.book_id).await?;
    if !book.has_copies() {
        return Err(ReservationError::NoCopiesAvailable);
    }
    if !book.rarity.is_reservable() {
        return Err(ReservationError::UniqueNotReservable);
    }
    if !book.allows_age(reader.age) {
        tracing::debug!(age = reader.age, age_limit = book.age_limit, "age limit not met");
        return Err(ReservationError::AgeLimitViolation);
    }

    let reservation = domain::reservation::issue(
        reader.id,
        book.id,
        cmd.requested_at,
        deps.policy.issue_period(),
    )
    .map_err(|_| ReservationError::InvalidIssuePeriod)?;
    let reservation_id = reservation.id;

    run_in_transaction(deps.unit_of_work.as_ref(), move |scope| {
        Box::pin(persist_new_reservation(scope, reservation))
    })
    .await?;

    tracing::info!(%reservation_id, "reservation created");
    Ok(reservation_id)
}

/// 予約を延長する（純粋な関数）
///
/// ビジネスルール：
/// 1. 読者の図書カードが有効であること
/// 2. 返却期限切れの予約がないこと
/// 3. 予約が Issued であること（延長は1回まで、Expired, Closed は不可）
/// 4. 書籍が Common であること
///
/// 状態の判定には保存済みの予約を使う。呼び出し側が古い値を持っていても
/// 二重延長にはならない。単一集約の更新のためトランザクションは不要。
///
/// # 戻り値
/// 延長後の予約
#[tracing::instrument(skip(deps, cmd), fields(reservation_id = %cmd.reservation.id))]
pub async fn renew_reservation(
    deps: &ServiceDependencies,
    cmd: RenewReservation,
) -> Result<Reservation> {
    let stored = load_reservation(deps, cmd.reservation.id).await?;
    renew_stored(deps, stored, cmd.extra_days, cmd.renewed_at).await
}

/// IDを指定して予約を延長する
#[tracing::instrument(skip(deps))]
pub async fn renew_reservation_by_id(
    deps: &ServiceDependencies,
    reservation_id: ReservationId,
    extra_days: Option<u32>,
    renewed_at: DateTime<Utc>,
) -> Result<Reservation> {
    let stored = load_reservation(deps, reservation_id).await?;
    renew_stored(deps, stored, extra_days, renewed_at).await
}

async fn renew_stored(
    deps: &ServiceDependencies,
    reservation: Reservation,
    extra_days: Option<u32>,
    renewed_at: DateTime<Utc>,
) -> Result<Reservation> {
    let extension_period = match extra_days {
        Some(0) => return Err(ReservationError::InvalidExtensionPeriod),
        Some(days) => Duration::days(i64::from(days)),
        None => deps.policy.extension_period(),
    };

    check_valid_lib_card(deps, reservation.reader_id)
        .await
        .map_err(|err| match err {
            ReservationError::LibCardMissing => ReservationError::LibCardInvalid,
            other => other,
        })?;
    check_no_expired_books(deps, reservation.reader_id, renewed_at).await?;

    let renewed = domain::reservation::renew(&reservation, renewed_at, extension_period)
        .map_err(|err| match err {
            RenewalError::AlreadyExtended => ReservationError::AlreadyExtended,
            RenewalError::NotRenewable(state) => ReservationError::NotRenewable(state),
            RenewalError::PeriodOutOfRange => ReservationError::InvalidExtensionPeriod,
        })?;

    let book = load_book(deps, reservation.book_id).await?;
    if !book.rarity.is_extendable() {
        tracing::debug!(rarity = book.rarity.as_str(), "book cannot be extended");
        return Err(ReservationError::RareOrUniqueNotExtendable);
    }

    deps.reservation_store
        .update(&renewed)
        .await
        .map_err(ReservationError::ReservationStoreError)?;

    tracing::info!(return_date = %renewed.return_date, "reservation extended");
    Ok(renewed)
}

/// トランザクション内：予約を閉じ、書籍の在庫を1冊戻す
///
/// 予約はロック付きで再取得し、同じ予約の二重返却を防ぐ。
///
/// # 戻り値
/// 返却前に期限切れだったか
async fn persist_closed_reservation(
    scope: &mut dyn TransactionScope,
    reservation_id: ReservationId,
    closed_at: DateTime<Utc>,
) -> Result<bool> {
    let reservation = scope
        .lock_reservation(reservation_id)
        .await
        .map_err(ReservationError::ReservationStoreError)?
        .ok_or(ReservationError::ReservationNotFound)?;

    let closed = domain::reservation::close(&reservation, closed_at)
        .map_err(|_| ReservationError::AlreadyClosed)?;

    let book = scope
        .lock_book(reservation.book_id)
        .await
        .map_err(ReservationError::BookStoreError)?
        .ok_or(ReservationError::BookNotFound)?;

    scope
        .update_reservation(&closed)
        .await
        .map_err(ReservationError::ReservationStoreError)?;

    scope
        .update_book(&book.return_copy())
        .await
        .map_err(ReservationError::BookStoreError)?;

    Ok(reservation.state == ReservationState::Expired)
}

/// 書籍を返却する（純粋な関数）
///
/// ビジネスルール：
/// - 予約が存在すること
/// - 既に返却済みでないこと
/// - 期限切れでも返却は受け付ける
///
/// 予約の状態更新と在庫の加算は1つのトランザクションで実行される。
#[tracing::instrument(skip(deps))]
pub async fn close_reservation(deps: &ServiceDependencies, cmd: CloseReservation) -> Result<()> {
    let CloseReservation {
        reservation_id,
        closed_at,
    } = cmd;

    let was_expired = run_in_transaction(deps.unit_of_work.as_ref(), move |scope| {
        Box::pin(persist_closed_reservation(scope, reservation_id, closed_at))
    })
    .await?;

    tracing::info!(was_expired, "reservation closed");
    Ok(())
}
