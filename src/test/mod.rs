pub mod read_lines;
