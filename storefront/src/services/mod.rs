// storefront/src/services/mod.rs

//! Outbound collaborators: the payment provider and the course service.

pub mod course_service;
pub mod payment;
pub mod payment_mock;

pub use course_service::{BlockTree, CcxconClient, CourseService, CourseServiceError, CreateCcxRequest};
pub use payment::{ChargeReceipt, PaymentError, PaymentGateway, StripeGateway};
pub use payment_mock::MockGateway;
