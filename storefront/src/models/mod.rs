// storefront/src/models/mod.rs

//! Catalog and purchase records as they are stored.

pub mod course;
pub mod instance;
pub mod module;
pub mod order;

pub use course::Course;
pub use instance::BackingInstance;
pub use module::Module;
pub use order::{Order, OrderLine};
