//! Scenario resolution and the classification cascade.

pub mod error;
pub mod orchestrator;
pub mod table;


pub use error::{Attempt, ScenarioError};
pub use orchestrator::Orchestrator;
pub use table::ScenarioTable;
