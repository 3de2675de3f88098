//! Input/output helpers.
//!
//! - CSV/spreadsheet ingest + column resolution (`ingest`)
//! - JSON envelope and cleaned CSV exports (`export`)
//! - workbook writers (`excel`)
//! - PDF report (`pdf`)

pub mod excel;
pub mod export;
pub mod ingest;
pub mod pdf;

pub use excel::*;
pub use export::*;
pub use ingest::*;
pub use pdf::*;
