//! Report sinks.
//!
//! The engine emits sink-independent [`ReportTable`](crate::report::ReportTable)s;
//! this module renders them. XLSX is the only production sink.

pub mod xlsx;

pub use xlsx::XlsxExporter;
