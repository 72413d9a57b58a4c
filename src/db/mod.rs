//! Database layer (SQLite).

pub mod schema;
pub mod sqlite;

pub use sqlite::{ActivityStore, SortOrder, StoreTransaction};
