//! The tools offered to the model.

mod detail;
mod search;

pub use detail::{DetailTool, DetailToolParameters};
pub use search::SearchTool;
