//! Map persistence: binary schema and text export.

pub mod binary;
pub mod text;

pub use binary::{load_binary_file, read_map, save_binary_file, write_map, SCHEMA_VERSION};
