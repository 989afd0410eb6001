pub mod config;
pub mod matrix;
pub mod objective;
pub mod pipeline;
pub mod reducer;
pub mod selector;

pub use config::{Config, SelectionConfig};
pub use reducer::Reducer;
pub use selector::LazyGreedySelector;
