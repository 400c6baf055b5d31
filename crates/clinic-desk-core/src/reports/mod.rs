//! Read-side aggregates over the stored collections.
//!
//! Every report is a pure function of the collections passed in; callers
//! load fresh data and recompute on each view.

mod dashboard;
mod operators;
mod vitals;

pub use dashboard::*;
pub use operators::*;
pub use vitals::*;

use chrono::Datelike;

use crate::models::dates::parse_timestamp;

/// Calendar (year, month) of a stored date in UTC.
pub fn month_of(value: &str) -> Option<(i32, u32)> {
    parse_timestamp(value).map(|at| (at.year(), at.month()))
}
