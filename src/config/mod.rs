pub mod combiner_config;
