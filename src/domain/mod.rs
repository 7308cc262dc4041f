pub mod catalog;
pub mod commands;
pub mod errors;
pub mod reservation;
pub mod value_objects;

pub use catalog::*;
pub use errors::*;
pub use value_objects::*;
