use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, LibCardId, Rarity, ReaderId};

/// 読者
///
/// 読者管理コンテキストが所有する。予約コンテキストは年齢制限の判定にのみ使う。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reader {
    pub id: ReaderId,
    pub full_name: String,
    pub phone_number: String,
    pub age: u32,
}

/// 書籍
///
/// カタログ管理コンテキストが所有する。
/// copies_number は予約作成時のトランザクション内でのみ減算される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub publisher: String,
    pub copies_number: u32,
    pub rarity: Rarity,
    pub genre: String,
    pub publishing_year: u32,
    pub language: String,
    pub age_limit: u32,
}

impl Book {
    /// 貸出可能な在庫があるか
    pub fn has_copies(&self) -> bool {
        self.copies_number > 0
    }

    /// 在庫を1冊減らした書籍を返す
    ///
    /// 在庫が0の場合は`None`。copies_number が負になることはない。
    pub fn take_copy(&self) -> Option<Book> {
        let copies_number = self.copies_number.checked_sub(1)?;
        Some(Book {
            copies_number,
            ..self.clone()
        })
    }

    /// 在庫を1冊戻した書籍を返す
    pub fn return_copy(&self) -> Book {
        Book {
            copies_number: self.copies_number.saturating_add(1),
            ..self.clone()
        }
    }

    /// 読者が年齢制限を満たすか
    pub fn allows_age(&self, age: u32) -> bool {
        age >= self.age_limit
    }
}

/// 図書カード
///
/// 有効期限による失効は図書カード側で action_status に反映済みとみなす。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibCard {
    pub id: LibCardId,
    pub reader_id: ReaderId,
    pub number: String,
    pub validity_days: u32,
    pub issue_date: DateTime<Utc>,
    pub action_status: bool,
}
