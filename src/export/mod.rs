pub mod csv;
pub mod report;

pub use csv::CsvExporter;
pub use report::write_run_report;
