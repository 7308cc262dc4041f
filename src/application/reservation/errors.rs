use crate::domain::{ReservationId, ReservationState};
use crate::ports::TransactionError;
use thiserror::Error;

/// エラーの種別
///
/// 呼び出し側（API層など）はこの種別でレスポンスを振り分ける。
/// Infrastructure 以外はすべて業務ルール違反。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    InvalidState,
    LimitExceeded,
    PolicyViolation,
    Infrastructure,
}

/// 予約管理アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum ReservationError {
    /// 読者が存在しない
    #[error("Reader not found")]
    ReaderNotFound,

    /// 書籍が存在しない
    #[error("Book not found")]
    BookNotFound,

    /// 図書カードが発行されていない
    #[error("Reader has no library card")]
    LibCardMissing,

    /// 予約が存在しない
    #[error("Reservation not found")]
    ReservationNotFound,

    /// 同じIDの予約が既に存在する
    #[error("Reservation {0} already exists")]
    ReservationAlreadyExists(ReservationId),

    /// 図書カードが無効
    #[error("Library card is not valid")]
    LibCardInvalid,

    /// 既に延長済み（延長は1回まで）
    #[error("Reservation has already been extended")]
    AlreadyExtended,

    /// 期限切れ・返却済みの予約は延長不可
    #[error("Reservation in state {0} cannot be renewed")]
    NotRenewable(ReservationState),

    /// 既に返却済み
    #[error("Reservation is already closed")]
    AlreadyClosed,

    /// Rare, Unique の書籍は延長不可
    #[error("Rare or unique books cannot be extended")]
    RareOrUniqueNotExtendable,

    /// 有効な予約の上限を超えている
    #[error("Active reservation limit exceeded (max {0})")]
    ActiveLimitExceeded(usize),

    /// 年齢制限を満たしていない
    #[error("Reader does not meet the age limit of the book")]
    AgeLimitViolation,

    /// Unique の書籍は予約不可
    #[error("Unique books cannot be reserved")]
    UniqueNotReservable,

    /// 返却期限切れの予約がある
    #[error("Reader has expired books")]
    HasExpiredBooks,

    /// 在庫がない
    #[error("No copies of the book are available")]
    NoCopiesAvailable,

    /// 延長日数が不正（0日、または返却期限が範囲外になる）
    #[error("Extension period must be at least one day and keep the return date in range")]
    InvalidExtensionPeriod,

    /// 貸出期間の設定で返却期限が範囲外になる
    #[error("Issue period puts the return date out of range")]
    InvalidIssuePeriod,

    /// ReaderStoreのエラー
    #[error("Reader store error")]
    ReaderStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// BookStoreのエラー
    #[error("Book store error")]
    BookStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// LibCardStoreのエラー
    #[error("Library card store error")]
    LibCardStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// ReservationStoreのエラー
    #[error("Reservation store error")]
    ReservationStoreError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// トランザクションの開始・確定のエラー
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl ReservationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReservationError::ReaderNotFound
            | ReservationError::BookNotFound
            | ReservationError::LibCardMissing
            | ReservationError::ReservationNotFound => ErrorKind::NotFound,

            ReservationError::ReservationAlreadyExists(_) => ErrorKind::AlreadyExists,

            ReservationError::LibCardInvalid
            | ReservationError::AlreadyExtended
            | ReservationError::NotRenewable(_)
            | ReservationError::AlreadyClosed
            | ReservationError::RareOrUniqueNotExtendable => ErrorKind::InvalidState,

            ReservationError::ActiveLimitExceeded(_) => ErrorKind::LimitExceeded,

            ReservationError::AgeLimitViolation
            | ReservationError::UniqueNotReservable
            | ReservationError::HasExpiredBooks
            | ReservationError::NoCopiesAvailable
            | ReservationError::InvalidExtensionPeriod
            | ReservationError::InvalidIssuePeriod => ErrorKind::PolicyViolation,

            ReservationError::ReaderStoreError(_)
            | ReservationError::BookStoreError(_)
            | ReservationError::LibCardStoreError(_)
            | ReservationError::ReservationStoreError(_)
            | ReservationError::Transaction(_) => ErrorKind::Infrastructure,
        }
    }

    /// 業務ルール違反か（インフラ障害でないか）
    pub fn is_domain_rule(&self) -> bool {
        self.kind() != ErrorKind::Infrastructure
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, ReservationError>;
