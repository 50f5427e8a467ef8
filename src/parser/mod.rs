pub mod cells;
pub mod rows;

pub use cells::{normalize_text, ColumnLayout};
pub use rows::parse_results;
