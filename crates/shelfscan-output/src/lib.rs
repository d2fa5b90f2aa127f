pub mod error;
pub mod flatten;
pub mod writer;

pub use error::OutputError;
pub use flatten::{flatten_result, flatten_results, FlatRow, COLUMNS};
pub use writer::{write_csv, write_excel, write_json, OutputWriter, WriteReport, SHEET_NAME};
