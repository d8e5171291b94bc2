pub mod handler;
pub mod model;

pub use handler::{create_review, delete_review, update_review};
