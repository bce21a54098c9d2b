pub mod connection;
pub mod error;
pub mod helpers;
mod migrations;
pub mod models;
pub mod repositories;

pub use connection::Database;
pub use error::{StoreError, StoreResult};
