pub mod book_store;
pub mod lib_card_store;
pub mod reader_store;
pub mod reservation_store;
pub mod unit_of_work;

// パブリックに型を再エクスポート
pub use book_store::BookStore as PostgresBookStore;
pub use lib_card_store::LibCardStore as PostgresLibCardStore;
pub use reader_store::ReaderStore as PostgresReaderStore;
pub use reservation_store::ReservationStore as PostgresReservationStore;
pub use unit_of_work::{PgTransactionScope, UnitOfWork as PostgresUnitOfWork};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// DBの値がドメインの型に変換できない場合のエラー
fn invalid_data(message: String) -> BoxError {
    Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, message))
}

/// u32 を INTEGER 列に書き込める値に変換する
fn to_db_int(column: &str, value: u32) -> Result<i32, BoxError> {
    i32::try_from(value).map_err(|_| invalid_data(format!("{} out of range: {}", column, value)))
}

/// INTEGER 列の値を u32 に変換する
fn from_db_int(column: &str, value: i32) -> Result<u32, BoxError> {
    u32::try_from(value).map_err(|_| invalid_data(format!("{} out of range: {}", column, value)))
}
