pub mod result_file;
pub mod staged_file;
