use crate::domain::{self, ReservationId};
use crate::ports::{TransactionScope, run_in_transaction};
use chrono::{DateTime, Utc};

use super::errors::{ReservationError, Result};
use super::reservation_service::ServiceDependencies;

/// トランザクション内：予約を再取得して期限切れにする
///
/// 候補取得後に延長・返却された予約は現在の行で判定し、スキップする。
///
/// # 戻り値
/// 期限切れにしたか
async fn expire_locked(
    scope: &mut dyn TransactionScope,
    reservation_id: ReservationId,
    now: DateTime<Utc>,
) -> Result<bool> {
    let Some(current) = scope
        .lock_reservation(reservation_id)
        .await
        .map_err(ReservationError::ReservationStoreError)?
    else {
        return Ok(false);
    };

    let Ok(expired) = domain::reservation::expire(&current, now) else {
        tracing::debug!(%reservation_id, state = %current.state, "no longer expirable");
        return Ok(false);
    };

    scope
        .update_reservation(&expired)
        .await
        .map_err(ReservationError::ReservationStoreError)?;

    Ok(true)
}

/// 期限切れ検出バッチ（純粋な関数）
///
/// 定期的に実行され、返却期限を過ぎた有効な予約を Expired にする。
/// 予約作成・延長のフローからは呼ばれない外部プロセス。
///
/// ビジネスルール：
/// - 返却期限（return_date）を過ぎた Issued, Extended の予約を期限切れとする
/// - 既に Expired の予約、Closed の予約は処理しない
///
/// 候補ごとに1トランザクションで、ロックした現在の行に対して判定する。
/// 並行する返却・延長を上書きしない。
///
/// # 戻り値
/// 期限切れにした予約の件数
#[tracing::instrument(skip(deps))]
pub async fn detect_expired_reservations(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
) -> Result<usize> {
    let candidates = deps
        .reservation_store
        .find_past_due(now)
        .await
        .map_err(ReservationError::ReservationStoreError)?;

    let mut expired_count = 0;
    for candidate in candidates {
        let reservation_id = candidate.id;
        let expired = run_in_transaction(deps.unit_of_work.as_ref(), move |scope| {
            Box::pin(expire_locked(scope, reservation_id, now))
        })
        .await?;

        if expired {
            expired_count += 1;
        }
    }

    tracing::info!(expired_count, "expiry sweep finished");
    Ok(expired_count)
}
