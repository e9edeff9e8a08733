pub mod aggregator;
pub mod engine;
mod model;
pub mod penalty;
pub mod ranker;
pub mod validator;
pub mod window;

pub use engine::ComplianceEngine;
pub use model::{ComplianceReport, Coverage, TeamRecord};
