//! Profile normalization, content generation and plan assembly.

pub mod explanation;
pub mod normalizer;
pub mod orchestrator;
pub mod quiz;
pub mod roadmap;
pub mod schema;

pub use orchestrator::{LearningPlan, PlanOrchestrator, PlanResponse};
