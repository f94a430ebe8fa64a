//! Domain models shared between the data service contract and the engine

pub mod dining_table;
pub mod order;
pub mod reservation;

pub use dining_table::{DiningTable, MergeGroup, TableStatus};
pub use order::{Order, OrderStatus};
pub use reservation::{Reservation, ReservationStatus};
