// lustre/src/workflow/mod.rs

//! Step workflows the lifecycle controllers are built on.

pub mod context;
pub mod control;
pub mod definition;
pub mod execution;
pub mod step;

pub use context::ContextData;
pub use control::{Control, SideEffectFailure, SideEffects, WorkflowResult, WorkflowRun};
pub use definition::{Handler, Workflow};
pub use step::{SkipCondition, StepDef, StepMode};
