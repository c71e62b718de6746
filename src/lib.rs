pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod finding;
pub mod logging;
pub mod project_graph;
pub mod rules;
pub mod scopes;
pub mod service;
pub mod span;

pub use config::{RunConfig, Settings};
pub use engine::RuleExecutionEngine;
pub use error::{EngineError, EngineResult};
pub use finding::{Edit, Finding, Severity};
pub use service::{AnalysisResult, ValidationService};
