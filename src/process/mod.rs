pub mod aggregate;
pub mod filter_lines;
pub mod materialize_archives;
pub mod tag_lines;
