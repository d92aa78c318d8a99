pub mod config;
pub mod engine;
pub mod error;
pub mod ir;
pub mod logging;
pub mod matching;
pub mod recipe;

pub use engine::{Engine, RewriteResult, Termination, run};
pub use error::{MalformedPatternError, PipelineError, RewriteError, ScopeNotFoundError};
