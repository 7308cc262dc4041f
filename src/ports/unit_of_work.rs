use crate::domain::{Book, BookId, ReservationId, reservation::Reservation};
use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// トランザクションの開始・確定に失敗した
#[derive(Debug, Error)]
#[error("Transaction {stage} failed")]
pub struct TransactionError {
    pub stage: &'static str,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

impl TransactionError {
    fn begin(source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self {
            stage: "begin",
            source,
        }
    }

    fn commit(source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self {
            stage: "commit",
            source,
        }
    }
}

/// 1つのトランザクションに束縛された書き込みハンドル
///
/// スコープ経由の書き込みは`commit`まで他から見えない。
/// `commit`せずにドロップされた場合（キャンセルを含む）はすべて破棄される。
#[async_trait]
pub trait TransactionScope: Send {
    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<()>;

    async fn update_reservation(&mut self, reservation: &Reservation) -> Result<()>;

    /// 予約を再取得し、トランザクション終了まで行をロックする
    async fn lock_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> Result<Option<Reservation>>;

    /// 書籍を再取得し、トランザクション終了まで行をロックする
    async fn lock_book(&mut self, book_id: BookId) -> Result<Option<Book>>;

    async fn update_book(&mut self, book: &Book) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Unit of Work ポート
///
/// 暗黙のコンテキストではなく、明示的なスコープを返す。
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn TransactionScope>>;
}

/// `work`を1つのトランザクションで実行する
///
/// `Ok`ならコミット、`Err`ならロールバックして`work`のエラーをそのまま返す。
/// ロールバック自体の失敗はログに残すのみで、元のエラーを優先する。
pub async fn run_in_transaction<T, E, F>(
    unit_of_work: &dyn UnitOfWork,
    work: F,
) -> std::result::Result<T, E>
where
    F: for<'s> FnOnce(
            &'s mut (dyn TransactionScope + 'static),
        ) -> BoxFuture<'s, std::result::Result<T, E>>
        + Send,
    E: From<TransactionError>,
{
    let mut scope = unit_of_work
        .begin()
        .await
        .map_err(TransactionError::begin)?;

    let outcome = work(scope.as_mut()).await;
    match outcome {
        Ok(value) => {
            scope.commit().await.map_err(TransactionError::commit)?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = scope.rollback().await {
                tracing::warn!("Rollback failed: {}", rollback_err);
            }
            Err(err)
        }
    }
}
