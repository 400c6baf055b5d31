//! Export boundary: backups, printed receipts and spreadsheet files.
//!
//! Everything here produces or consumes text; choosing where the text is
//! written (file dialog, share sheet, printer) is left to the host.

mod receipt;
mod snapshot;
mod spreadsheet;

pub use receipt::*;
pub use snapshot::*;
pub use spreadsheet::*;
