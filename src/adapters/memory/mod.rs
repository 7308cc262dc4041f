mod stores;
mod unit_of_work;

use crate::domain::{Book, BookId, LibCard, Reader, ReaderId, ReservationId, reservation::Reservation};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tokio::sync::Mutex;

pub use unit_of_work::MemoryScope;

/// インメモリアダプタのエラー
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Injected failure: {0}")]
    InjectedFailure(&'static str),
}

#[derive(Debug, Clone, Default)]
struct Tables {
    readers: HashMap<ReaderId, Reader>,
    books: HashMap<BookId, Book>,
    lib_cards: HashMap<ReaderId, LibCard>,
    reservations: HashMap<ReservationId, Reservation>,
}

#[derive(Debug, Default)]
struct Faults {
    fail_book_updates: AtomicBool,
    stall_book_updates: AtomicBool,
}

/// 全ストアと UnitOfWork のインメモリ実装
///
/// 全テーブルを1つの非同期Mutexで保護する。トランザクションはコミットまたは
/// ドロップまでMutexを保持するため、トランザクション同士は直列化され、
/// 通常のストア呼び出しはその完了を待つ。
/// トランザクション内の書き込みはテーブルの複製に対して行い、コミット時に置き換える。
///
/// テストや PostgreSQL なしでの実行に使用する。
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    tables: Arc<Mutex<Tables>>,
    faults: Arc<Faults>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用に読者を登録（ストアのトレイトを経由しない）
    pub async fn insert_reader(&self, reader: Reader) {
        self.tables.lock().await.readers.insert(reader.id, reader);
    }

    pub async fn insert_book(&self, book: Book) {
        self.tables.lock().await.books.insert(book.id, book);
    }

    pub async fn insert_lib_card(&self, lib_card: LibCard) {
        self.tables
            .lock()
            .await
            .lib_cards
            .insert(lib_card.reader_id, lib_card);
    }

    pub async fn insert_reservation(&self, reservation: Reservation) {
        self.tables
            .lock()
            .await
            .reservations
            .insert(reservation.id, reservation);
    }

    /// コミット済みの書籍を取得
    pub async fn book(&self, book_id: BookId) -> Option<Book> {
        self.tables.lock().await.books.get(&book_id).cloned()
    }

    /// コミット済みの予約を取得
    pub async fn reservation(&self, reservation_id: ReservationId) -> Option<Reservation> {
        self.tables
            .lock()
            .await
            .reservations
            .get(&reservation_id)
            .cloned()
    }

    /// コミット済みの予約件数
    pub async fn reservation_count(&self) -> usize {
        self.tables.lock().await.reservations.len()
    }
}

/// テスト用の障害注入
///
/// 本番の経路からは呼ばれない。
#[allow(dead_code)]
impl MemoryDatabase {
    /// テスト用：トランザクション内の`update_book`を失敗させる（ロールバックの確認用）
    pub fn fail_book_updates(&self, enabled: bool) {
        self.faults
            .fail_book_updates
            .store(enabled, Ordering::SeqCst);
    }

    /// テスト用：トランザクション内の`update_book`を完了させない（キャンセルの確認用）
    pub fn stall_book_updates(&self, enabled: bool) {
        self.faults
            .stall_book_updates
            .store(enabled, Ordering::SeqCst);
    }
}
