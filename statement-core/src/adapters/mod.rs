//! Adapter implementations.
//!
//! Adapters implement the port traits with concrete technologies:
//! - `csv` for delimited text sources
//! - `calamine` for binary (.xls) and zipped-XML (.xlsx) spreadsheet sources
//! - `pdf-extract` for the PDF text layer

pub mod delimited;
pub mod pdf;
pub mod spreadsheet;

pub use delimited::DelimitedSource;
pub use spreadsheet::SpreadsheetSource;
