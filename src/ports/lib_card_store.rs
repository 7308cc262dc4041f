use crate::domain::{LibCard, ReaderId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 図書カードストアポート
#[async_trait]
pub trait LibCardStore: Send + Sync {
    /// 読者の図書カードを取得する
    ///
    /// ビジネスルール: 有効な図書カードがない読者は予約・延長できない。
    async fn get_by_reader_id(&self, reader_id: ReaderId) -> Result<Option<LibCard>>;

    /// 図書カードを発行する
    async fn create(&self, lib_card: &LibCard) -> Result<()>;

    /// 図書カードを更新する
    async fn update(&self, lib_card: &LibCard) -> Result<()>;
}
