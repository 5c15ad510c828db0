pub mod import;
pub mod report_writer;
