use crate::domain::{Book, BookId, ReservationId, reservation::Reservation};
use crate::ports::unit_of_work::{Result, TransactionScope, UnitOfWork};
use crate::ports::DuplicateReservation;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::OwnedMutexGuard;

use super::{Faults, MemoryDatabase, MemoryStoreError, Tables};

/// [`MemoryDatabase`] のトランザクションスコープ
///
/// 生存中はテーブルのロックを保持する。`commit`せずにドロップされた場合、
/// 複製への書き込みは破棄される。
pub struct MemoryScope {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
    faults: Arc<Faults>,
}

#[async_trait]
impl UnitOfWork for MemoryDatabase {
    async fn begin(&self) -> Result<Box<dyn TransactionScope>> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();

        Ok(Box::new(MemoryScope {
            guard,
            staged,
            faults: self.faults.clone(),
        }))
    }
}

#[async_trait]
impl TransactionScope for MemoryScope {
    async fn insert_reservation(&mut self, reservation: &Reservation) -> Result<()> {
        if self.staged.reservations.contains_key(&reservation.id) {
            return Err(Box::new(DuplicateReservation(reservation.id)));
        }
        self.staged
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn update_reservation(&mut self, reservation: &Reservation) -> Result<()> {
        let Some(stored) = self.staged.reservations.get_mut(&reservation.id) else {
            return Err(Box::new(MemoryStoreError::NotFound("reservation")));
        };
        *stored = reservation.clone();
        Ok(())
    }

    async fn lock_reservation(
        &mut self,
        reservation_id: ReservationId,
    ) -> Result<Option<Reservation>> {
        Ok(self.staged.reservations.get(&reservation_id).cloned())
    }

    async fn lock_book(&mut self, book_id: BookId) -> Result<Option<Book>> {
        // テーブル全体はこのスコープがロック済み
        Ok(self.staged.books.get(&book_id).cloned())
    }

    async fn update_book(&mut self, book: &Book) -> Result<()> {
        if self.faults.fail_book_updates.load(Ordering::SeqCst) {
            return Err(Box::new(MemoryStoreError::InjectedFailure("update_book")));
        }
        if self.faults.stall_book_updates.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        let Some(stored) = self.staged.books.get_mut(&book.id) else {
            return Err(Box::new(MemoryStoreError::NotFound("book")));
        };
        *stored = book.clone();
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryScope {
            mut guard, staged, ..
        } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        drop(self);
        Ok(())
    }
}
