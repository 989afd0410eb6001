pub mod config;
pub mod reduce;
