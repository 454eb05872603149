// storefront/src/products/mod.rs

//! Public product identity, availability and the read-side JSON shape.

pub mod availability;
pub mod identity;
pub mod view;

pub use availability::{to_cents, to_cents_f64, Product};
pub use identity::{get_product_type, make_external_pk, make_qualified_id, ProductType};
pub use view::ProductView;
