//! Results store backed by SQLite

pub mod init;
pub mod results;

pub use init::init_database;
pub use results::{format_timestamp, render_csv, ResultStore, CSV_HEADER, DOWNLOAD_FILE_NAME};
