pub mod handler;
pub mod model;

pub use handler::{list_favorites, toggle_favorite};
