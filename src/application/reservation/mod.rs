mod errors;
mod expiry_detection;
mod queries;
mod reservation_service;

pub use errors::{ErrorKind, ReservationError, Result};
pub use expiry_detection::detect_expired_reservations;
pub use queries::{get_reservation, list_reservations_by_book, list_reservations_by_reader};
pub use reservation_service::{
    ServiceDependencies, close_reservation, create_reservation, renew_reservation,
    renew_reservation_by_id,
};
