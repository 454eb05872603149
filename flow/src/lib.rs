// flow/src/lib.rs

//! Step pipelines for request workflows.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step may carry
//! `before`, `on` and `after` handlers which receive a shared
//! [`ContextData`] and answer with a [`PipelineControl`]. Steps can be
//! optional (no handlers is fine) or skipped by a condition evaluated against
//! the context. A [`Registry`] keeps one pipeline per context type so callers
//! can run a workflow by handing over its context.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::{SkipCondition, StepDef};
pub use crate::core::Handler;
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::Pipeline;
pub use crate::registry::Registry;
