//! Domain models for the clinic desk.

mod activity;
mod appointment;
mod catalog;
pub mod dates;
mod invoice;
mod patient;

pub use activity::*;
pub use appointment::*;
pub use catalog::*;
pub use invoice::*;
pub use patient::*;

/// A record identified by a numeric ID within its collection.
pub trait Record {
    fn id(&self) -> i64;
}

/// Largest ID in a collection, or 0 when empty.
pub fn max_id<T: Record>(records: &[T]) -> i64 {
    records.iter().map(Record::id).max().unwrap_or(0)
}
