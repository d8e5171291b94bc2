pub mod handler;
pub mod model;

pub use handler::{
    create_product, delete_product, get_product, list_products, set_publish, update_product,
};
