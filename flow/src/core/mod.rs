// flow/src/core/mod.rs
pub mod context_data;
pub mod control;
pub mod step;

use std::future::Future;
use std::pin::Pin;

pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult};
pub use step::StepDef;

/// A boxed step handler.
///
/// Handlers get their own clone of the shared context. Lock guards taken from
/// it must be released before the handler awaits anything.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;
