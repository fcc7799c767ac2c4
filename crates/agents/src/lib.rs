//! The agent family.
//!
//! Six specialized LLM-backed agents sharing prompt loading, invocation
//! through the cached [`Llm`] handle, and per-agent usage accounting.
//!
//! [`Llm`]: nv_providers::Llm

pub mod actor;
pub mod area;
pub mod base;
pub mod changes;
pub mod locator;
pub mod planner;
pub mod prompt;
pub mod retriever;

pub use actor::ActorAgent;
pub use area::AreaAgent;
pub use changes::ChangesAnalyzerAgent;
pub use locator::{LocatedElement, LocatorAgent};
pub use planner::PlannerAgent;
pub use retriever::{RetrievedValue, RetrieverAgent};
