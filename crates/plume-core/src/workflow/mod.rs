//! Multi-stage copy workflow: search, plan, write, then edit until approved.

mod engine;
mod state;

pub use engine::{
    MAX_REVISIONS, WorkflowEngine, WorkflowOptions, WorkflowStage, is_approved, next_stage,
};
pub use state::{AgentState, StageUpdate, merge_trace};
