use crate::domain::reservation::{Reservation, is_past_due};
use crate::domain::{Book, BookId, LibCard, Reader, ReaderId, ReservationId};
use crate::ports::{
    BookStore, DuplicateReservation, LibCardStore, ReaderStore, ReservationStore, book_store,
    lib_card_store, reader_store, reservation_store,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{MemoryDatabase, MemoryStoreError};

impl MemoryDatabase {
    async fn select_reservations<F>(&self, predicate: F) -> Vec<Reservation>
    where
        F: Fn(&Reservation) -> bool,
    {
        let tables = self.tables.lock().await;
        let mut found: Vec<Reservation> = tables
            .reservations
            .values()
            .filter(|r| predicate(r))
            .cloned()
            .collect();
        // SQL実装と同じく新しい順
        found.sort_by(|a, b| b.issue_date.cmp(&a.issue_date));
        found
    }
}

#[async_trait]
impl ReaderStore for MemoryDatabase {
    async fn get_by_id(&self, reader_id: ReaderId) -> reader_store::Result<Option<Reader>> {
        Ok(self.tables.lock().await.readers.get(&reader_id).cloned())
    }

    async fn create(&self, reader: &Reader) -> reader_store::Result<()> {
        self.tables
            .lock()
            .await
            .readers
            .insert(reader.id, reader.clone());
        Ok(())
    }
}

#[async_trait]
impl BookStore for MemoryDatabase {
    async fn get_by_id(&self, book_id: BookId) -> book_store::Result<Option<Book>> {
        Ok(self.tables.lock().await.books.get(&book_id).cloned())
    }

    async fn create(&self, book: &Book) -> book_store::Result<()> {
        self.tables.lock().await.books.insert(book.id, book.clone());
        Ok(())
    }

    async fn update(&self, book: &Book) -> book_store::Result<()> {
        let mut tables = self.tables.lock().await;
        let Some(stored) = tables.books.get_mut(&book.id) else {
            return Err(Box::new(MemoryStoreError::NotFound("book")));
        };
        *stored = book.clone();
        Ok(())
    }
}

#[async_trait]
impl LibCardStore for MemoryDatabase {
    async fn get_by_reader_id(
        &self,
        reader_id: ReaderId,
    ) -> lib_card_store::Result<Option<LibCard>> {
        Ok(self.tables.lock().await.lib_cards.get(&reader_id).cloned())
    }

    async fn create(&self, lib_card: &LibCard) -> lib_card_store::Result<()> {
        self.tables
            .lock()
            .await
            .lib_cards
            .insert(lib_card.reader_id, lib_card.clone());
        Ok(())
    }

    async fn update(&self, lib_card: &LibCard) -> lib_card_store::Result<()> {
        let mut tables = self.tables.lock().await;
        let Some(stored) = tables.lib_cards.get_mut(&lib_card.reader_id) else {
            return Err(Box::new(MemoryStoreError::NotFound("library card")));
        };
        *stored = lib_card.clone();
        Ok(())
    }
}

#[async_trait]
impl ReservationStore for MemoryDatabase {
    async fn create(&self, reservation: &Reservation) -> reservation_store::Result<()> {
        let mut tables = self.tables.lock().await;
        if tables.reservations.contains_key(&reservation.id) {
            return Err(Box::new(DuplicateReservation(reservation.id)));
        }
        tables
            .reservations
            .insert(reservation.id, reservation.clone());
        Ok(())
    }

    async fn update(&self, reservation: &Reservation) -> reservation_store::Result<()> {
        let mut tables = self.tables.lock().await;
        let Some(stored) = tables.reservations.get_mut(&reservation.id) else {
            return Err(Box::new(MemoryStoreError::NotFound("reservation")));
        };
        *stored = reservation.clone();
        Ok(())
    }

    async fn get_by_id(
        &self,
        reservation_id: ReservationId,
    ) -> reservation_store::Result<Option<Reservation>> {
        Ok(self
            .tables
            .lock()
            .await
            .reservations
            .get(&reservation_id)
            .cloned())
    }

    async fn get_active_by_reader_id(
        &self,
        reader_id: ReaderId,
    ) -> reservation_store::Result<Vec<Reservation>> {
        Ok(self
            .select_reservations(|r| r.reader_id == reader_id && r.state.is_active())
            .await)
    }

    async fn get_expired_by_reader_id(
        &self,
        reader_id: ReaderId,
        now: DateTime<Utc>,
    ) -> reservation_store::Result<Vec<Reservation>> {
        Ok(self
            .select_reservations(|r| r.reader_id == reader_id && is_past_due(r, now))
            .await)
    }

    async fn get_by_book_id(&self, book_id: BookId) -> reservation_store::Result<Vec<Reservation>> {
        Ok(self.select_reservations(|r| r.book_id == book_id).await)
    }

    async fn get_by_reader_id(
        &self,
        reader_id: ReaderId,
    ) -> reservation_store::Result<Vec<Reservation>> {
        Ok(self.select_reservations(|r| r.reader_id == reader_id).await)
    }

    async fn find_past_due(
        &self,
        cutoff: DateTime<Utc>,
    ) -> reservation_store::Result<Vec<Reservation>> {
        Ok(self
            .select_reservations(|r| r.state.is_active() && r.return_date < cutoff)
            .await)
    }
}
