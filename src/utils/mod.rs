pub mod debounce;

pub use debounce::{ActionFuture, Debouncer};
