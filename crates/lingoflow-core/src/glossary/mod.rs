pub mod csv;
pub mod editor;
pub mod error;

pub use csv::{csv_file_name, export_csv, import_csv, merge_into, CsvRow};
pub use editor::{EditSession, GlossaryEditor, TermDraft};
pub use error::{GlossaryError, GlossaryResult};
