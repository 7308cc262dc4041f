use crate::domain::{Reader, ReaderId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 読者ストアポート
///
/// 予約コンテキストは読者の存在確認と年齢の参照にのみ使う。
#[async_trait]
pub trait ReaderStore: Send + Sync {
    /// IDで読者を取得する
    async fn get_by_id(&self, reader_id: ReaderId) -> Result<Option<Reader>>;

    /// 読者を登録する
    async fn create(&self, reader: &Reader) -> Result<()>;
}
