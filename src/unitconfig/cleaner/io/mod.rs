pub mod excel_write;
pub mod export;
pub mod load;

pub use export::{cleaned_file_name, export_table, normalize_na};
pub use load::{SourceFormat, load_path, load_table};
