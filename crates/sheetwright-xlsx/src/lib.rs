//! # sheetwright-xlsx
//!
//! XLSX (Office Open XML) package support for sheetwright.
//!
//! [`XlsxReader`] and [`XlsxWriter`] convert between a package and a
//! [`Workbook`](sheetwright_core::Workbook); [`XlsxStore`] ties them to a file
//! path as a [`DocumentStore`](sheetwright_core::DocumentStore).

pub mod error;
pub mod options;
pub mod reader;
pub mod store;
pub mod writer;

pub use error::{XlsxError, XlsxResult};
pub use options::{Compression, StoreOptions};
pub use reader::XlsxReader;
pub use store::XlsxStore;
pub use writer::XlsxWriter;
