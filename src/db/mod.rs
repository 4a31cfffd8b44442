pub mod audit;
pub mod commissions;
pub mod connection;
pub mod properties;
pub mod users;

pub use connection::{init_db, Database};
