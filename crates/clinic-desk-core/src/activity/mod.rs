//! Activity log: audit trail, unread tracking and message linkification.

mod links;
mod log;
mod poll;

pub use self::links::*;
pub use self::log::*;
pub use self::poll::*;
