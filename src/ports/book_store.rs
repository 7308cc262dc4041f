use crate::domain::{Book, BookId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍ストアポート
///
/// 予約コンテキストとカタログコンテキストの境界を維持する。
/// トランザクション外の読み取りは資格チェックにのみ使い、
/// 在庫数の更新は`TransactionScope`経由で行う。
#[async_trait]
pub trait BookStore: Send + Sync {
    /// IDで書籍を取得する
    async fn get_by_id(&self, book_id: BookId) -> Result<Option<Book>>;

    /// 書籍を登録する
    async fn create(&self, book: &Book) -> Result<()>;

    /// 書籍を更新する
    async fn update(&self, book: &Book) -> Result<()>;
}
