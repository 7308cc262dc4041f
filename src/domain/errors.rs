use super::ReservationState;

/// 発行のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueError {
    /// 返却期限が表現できる日時の範囲を超える
    PeriodOutOfRange,
}

/// 延長のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenewalError {
    /// 既に延長済み（延長は1回まで）
    AlreadyExtended,
    /// 期限切れ・返却済みの予約は延長不可
    NotRenewable(ReservationState),
    /// 返却期限が表現できる日時の範囲を超える
    PeriodOutOfRange,
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseError {
    /// 既に返却済み
    AlreadyClosed,
}

/// 期限切れ処理のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpireError {
    /// Issued, Extended 以外は期限切れにできない
    NotActive(ReservationState),
    /// 返却期限前
    NotPastDue,
}
