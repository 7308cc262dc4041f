pub mod book_store;
pub mod lib_card_store;
pub mod reader_store;
pub mod reservation_store;
pub mod unit_of_work;

pub use book_store::BookStore;
pub use lib_card_store::LibCardStore;
pub use reader_store::ReaderStore;
pub use reservation_store::{DuplicateReservation, ReservationStore};
pub use unit_of_work::{TransactionError, TransactionScope, UnitOfWork, run_in_transaction};
