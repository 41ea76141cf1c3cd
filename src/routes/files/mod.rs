mod handler;

pub use handler::{get_file, list_files};
