pub mod handler;
pub mod model;

pub use handler::{create_banner, delete_banner, list_banners};
