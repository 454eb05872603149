// storefront/src/lib.rs

//! A storefront selling seats in custom courses (CCX) run on edX instances.
//!
//! The catalog is kept in step with CCXCon through signed webhooks, carts are
//! validated and paid for in one unit of work, and each purchased module is
//! then announced to CCXCon. Course modules are filled in asynchronously from
//! the course's block tree; course owners publish and price them.

pub mod cart;
pub mod catalog;
pub mod config;
pub mod course_edit;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod population;
pub mod products;
pub mod reconciler;
pub mod services;
pub mod state;
pub mod web;
