use crate::domain::{Book, BookId, ReservationId, reservation::Reservation};
use crate::ports::unit_of_work::{Result, TransactionScope, UnitOfWork as UnitOfWorkTrait};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use super::{book_store, reservation_store};

/// UnitOfWorkのPostgreSQL実装
///
/// 1スコープ = 1 DBトランザクション。
pub struct UnitOfWork {
    pool: PgPool,
}

impl UnitOfWork {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkTrait for UnitOfWork {
    async fn begin(&self) -> Result<Box<dyn TransactionScope>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransactionScope { tx }))
    }
}

/// DBトランザクションに束縛されたスコープ
///
/// コミットせずにドロップされた場合、sqlx がロールバックする。
pub struct PgTransactionScope {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl TransactionScope for PgTransactionScope {
    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<()> {
        reservation_store::insert_reservation(&mut *self.tx, reservation).await
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> Result<()> {
        reservation_store::update_reservation(&mut *self.tx, reservation).await
    }

    async fn lock_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> Result<Option<Reservation>> {
        reservation_store::select_reservation(&mut *self.tx, reservation_id, true).await
    }

    /// SELECT ... FOR UPDATE で書籍の行をロックする
    ///
    /// 同じ書籍への並行した予約作成はここで直列化される。
    async fn lock_book(&mut self, book_id: BookId) -> Result<Option<Book>> {
        book_store::select_book(&mut *self.tx, book_id, true).await
    }

    async fn update_book(&mut self, book: &Book) -> Result<()> {
        book_store::update_book(&mut *self.tx, book).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
