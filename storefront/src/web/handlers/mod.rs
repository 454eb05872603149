// storefront/src/web/handlers/mod.rs

pub mod checkout_handlers;
pub mod course_handlers;
pub mod product_handlers;
pub mod status_handlers;
pub mod webhook_handlers;
