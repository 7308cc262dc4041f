use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{
    BookId, CloseError, ExpireError, IssueError, ReaderId, RenewalError, ReservationId,
    ReservationState,
};

/// 予約集約 - 1人の読者への1冊の貸出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    // 識別子（作成後不変）
    pub id: ReservationId,

    // 他の集約への参照（IDのみ）
    pub reader_id: ReaderId,
    pub book_id: BookId,

    pub issue_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub state: ReservationState,
}

/// 純粋関数：予約を発行する
///
/// ビジネスルール：
/// - 状態はIssued
/// - 返却期限は発行日 + 貸出期間（表現できない日時になる場合はエラー）
///
/// 副作用なし。資格チェックはアプリケーション層の責務。
pub fn issue(
    reader_id: ReaderId,
    book_id: BookId,
    issued_at: DateTime<Utc>,
    issue_period: Duration,
) -> Result<Reservation, IssueError> {
    let return_date = issued_at
        .checked_add_signed(issue_period)
        .ok_or(IssueError::PeriodOutOfRange)?;

    Ok(Reservation {
        id: ReservationId::new(),
        reader_id,
        book_id,
        issue_date: issued_at,
        return_date,
        state: ReservationState::Issued,
    })
}

/// 純粋関数：予約を延長する
///
/// ビジネスルール：
/// - 延長は1回まで（Extendedは再延長不可）
/// - Expired, Closed は延長不可
/// - 延長時：発行日を延長日に、返却期限を延長日 + 延長期間に置き換える
pub fn renew(
    reservation: &Reservation,
    renewed_at: DateTime<Utc>,
    extension_period: Duration,
) -> Result<Reservation, RenewalError> {
    match reservation.state {
        ReservationState::Issued => {
            let return_date = renewed_at
                .checked_add_signed(extension_period)
                .ok_or(RenewalError::PeriodOutOfRange)?;
            Ok(Reservation {
                issue_date: renewed_at,
                return_date,
                state: ReservationState::Extended,
                ..reservation.clone()
            })
        }
        ReservationState::Extended => Err(RenewalError::AlreadyExtended),
        state @ (ReservationState::Expired | ReservationState::Closed) => {
            Err(RenewalError::NotRenewable(state))
        }
    }
}

/// 純粋関数：予約を閉じる（返却）
///
/// 期限切れでも返却は受け付ける。return_date は実際の返却日時で上書きする。
pub fn close(reservation: &Reservation, closed_at: DateTime<Utc>) -> Result<Reservation, CloseError> {
    if reservation.state == ReservationState::Closed {
        return Err(CloseError::AlreadyClosed);
    }

    Ok(Reservation {
        return_date: closed_at,
        state: ReservationState::Closed,
        ..reservation.clone()
    })
}

/// 純粋関数：予約を期限切れにする
///
/// 返却期限を過ぎた有効な予約（Issued, Extended）のみが対象。
pub fn expire(reservation: &Reservation, now: DateTime<Utc>) -> Result<Reservation, ExpireError> {
    if !reservation.state.is_active() {
        return Err(ExpireError::NotActive(reservation.state));
    }
    if !is_past_due(reservation, now) {
        return Err(ExpireError::NotPastDue);
    }

    Ok(Reservation {
        state: ReservationState::Expired,
        ..reservation.clone()
    })
}

/// 返却期限を過ぎた未返却の予約か
///
/// Expired も含む。この状態の予約を持つ読者は新規予約・延長ができない。
pub fn is_past_due(reservation: &Reservation, now: DateTime<Utc>) -> bool {
    reservation.state != ReservationState::Closed && reservation.return_date < now
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issued_at(at: DateTime<Utc>) -> Reservation {
        issue(ReaderId::new(), BookId::new(), at, Duration::days(14)).unwrap()
    }

    #[test]
    fn test_issue_sets_return_date_after_issue_period() {
        let now = Utc::now();
        let reservation = issued_at(now);

        assert_eq!(reservation.state, ReservationState::Issued);
        assert_eq!(reservation.issue_date, now);
        assert_eq!(reservation.return_date, now + Duration::days(14));
    }

    #[test]
    fn test_renew_moves_issued_to_extended() {
        let issued = Utc::now() - Duration::days(3);
        let reservation = issued_at(issued);
        let now = Utc::now();

        let renewed = renew(&reservation, now, Duration::days(7)).unwrap();

        assert_eq!(renewed.id, reservation.id);
        assert_eq!(renewed.state, ReservationState::Extended);
        assert_eq!(renewed.issue_date, now);
        assert_eq!(renewed.return_date, now + Duration::days(7));
    }

    #[test]
    fn test_renew_fails_when_already_extended() {
        let now = Utc::now();
        let renewed = renew(&issued_at(now), now, Duration::days(7)).unwrap();

        assert_eq!(
            renew(&renewed, now, Duration::days(7)),
            Err(RenewalError::AlreadyExtended)
        );
    }

    #[test]
    fn test_renew_fails_for_terminal_states() {
        let now = Utc::now();
        for state in [ReservationState::Expired, ReservationState::Closed] {
            let reservation = Reservation {
                state,
                ..issued_at(now)
            };
            assert_eq!(
                renew(&reservation, now, Duration::days(7)),
                Err(RenewalError::NotRenewable(state))
            );
        }
    }

    #[test]
    fn test_close_accepts_expired_reservation() {
        let now = Utc::now();
        let expired = Reservation {
            state: ReservationState::Expired,
            ..issued_at(now - Duration::days(30))
        };

        let closed = close(&expired, now).unwrap();

        assert_eq!(closed.state, ReservationState::Closed);
        assert_eq!(closed.return_date, now);
    }

    #[test]
    fn test_close_fails_when_already_closed() {
        let now = Utc::now();
        let closed = close(&issued_at(now), now).unwrap();

        assert_eq!(close(&closed, now), Err(CloseError::AlreadyClosed));
    }

    #[test]
    fn test_expire_requires_past_due() {
        let now = Utc::now();
        assert_eq!(expire(&issued_at(now), now), Err(ExpireError::NotPastDue));

        let overdue = issued_at(now - Duration::days(15));
        assert_eq!(
            expire(&overdue, now).unwrap().state,
            ReservationState::Expired
        );
    }

    #[test]
    fn test_expire_ignores_inactive_states() {
        let now = Utc::now();
        let closed = Reservation {
            state: ReservationState::Closed,
            ..issued_at(now - Duration::days(30))
        };

        assert_eq!(
            expire(&closed, now),
            Err(ExpireError::NotActive(ReservationState::Closed))
        );
    }

    #[test]
    fn test_is_past_due() {
        let now = Utc::now();
        let overdue = issued_at(now - Duration::days(15));

        assert!(is_past_due(&overdue, now));
        assert!(!is_past_due(&issued_at(now), now));

        let closed = Reservation {
            state: ReservationState::Closed,
            ..overdue.clone()
        };
        assert!(!is_past_due(&closed, now));

        let expired = Reservation {
            state: ReservationState::Expired,
            ..overdue
        };
        assert!(is_past_due(&expired, now));
    }

    #[test]
    fn test_issue_rejects_unrepresentable_return_date() {
        let result = issue(
            ReaderId::new(),
            BookId::new(),
            Utc::now(),
            Duration::days(i64::from(u32::MAX)),
        );

        assert_eq!(result, Err(IssueError::PeriodOutOfRange));
    }

    #[test]
    fn test_renew_rejects_unrepresentable_return_date() {
        let now = Utc::now();
        let reservation = issued_at(now);

        assert_eq!(
            renew(&reservation, now, Duration::days(i64::from(u32::MAX))),
            Err(RenewalError::PeriodOutOfRange)
        );
    }
}
